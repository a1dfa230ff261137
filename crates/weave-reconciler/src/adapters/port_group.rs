//! Port groups: named entries of a node's `ports/groups` map.

use super::{HostInstance, Owner};
use serde_json::Value;
use weave_core::{CellId, DataProps, ElementKind, Props, data_props};
use weave_engine::{CanvasEngine, CellKind};

pub struct PortGroupInstance {
    kind: ElementKind,
    name: String,
    group: DataProps,
    owner: Option<CellId>,
    removed: bool,
}

impl PortGroupInstance {
    pub fn create(props: &Props) -> Result<Self, String> {
        let (name, group) = split_group(props)?;
        Ok(Self {
            kind: ElementKind::PortGroup,
            name,
            group,
            owner: None,
            removed: false,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn path(&self) -> String {
        format!("ports/groups/{}", self.name)
    }

    fn apply(&self, engine: &mut dyn CanvasEngine) -> Result<(), String> {
        let Some(owner) = self.owner else {
            return Ok(());
        };
        if !engine.has_cell(owner) {
            log::debug!("port group {}: node {owner} is gone", self.name);
            return Ok(());
        }
        engine.set_prop_at(owner, &self.path(), Value::Object(self.group.clone()))?;
        Ok(())
    }
}

fn split_group(props: &Props) -> Result<(String, DataProps), String> {
    let mut group = data_props(props);
    match group.remove("name") {
        Some(Value::String(name)) if !name.is_empty() => Ok((name, group)),
        _ => Err("PortGroup requires a non-empty string `name`".to_string()),
    }
}

impl HostInstance for PortGroupInstance {
    fn kind(&self) -> &ElementKind {
        &self.kind
    }

    fn update(&mut self, _old: &Props, new: &Props, engine: &mut dyn CanvasEngine) -> Result<(), String> {
        let (name, group) = split_group(new)?;
        if name == self.name && group == self.group {
            log::debug!("port group {}: data unchanged", self.name);
            return Ok(());
        }
        if name != self.name
            && !self.removed
            && let Some(owner) = self.owner
        {
            engine.remove_prop_at(owner, &self.path())?;
        }
        self.name = name;
        self.group = group;
        if self.removed {
            return Ok(());
        }
        self.apply(engine)
    }

    fn insert_into(&mut self, owner: Option<Owner>, engine: &mut dyn CanvasEngine) -> Result<(), String> {
        let Some(owner) = owner else {
            log::debug!("port group {}: owner has no cell yet", self.name);
            return Ok(());
        };
        if owner.kind != CellKind::Node {
            log::warn!("port group {} only attaches to nodes, not {}; skipped", self.name, owner.cell);
            return Ok(());
        }
        self.owner = Some(owner.cell);
        self.removed = false;
        self.apply(engine)
    }

    fn remove_from(&mut self, engine: &mut dyn CanvasEngine) {
        if self.removed {
            return;
        }
        self.removed = true;
        let Some(owner) = self.owner else {
            return;
        };
        if let Err(e) = engine.remove_prop_at(owner, &self.path()) {
            log::warn!("port group {}: {e}", self.name);
        }
    }

    fn is_removed(&self) -> bool {
        self.removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use weave_core::Element;
    use weave_engine::Graph;

    #[test]
    fn group_is_written_under_its_name() {
        let mut graph = Graph::default();
        let mut spec = DataProps::new();
        spec.insert("id".into(), json!("pg_n"));
        let cell = graph.add_cell(CellKind::Node, spec).unwrap();
        let owner = Owner { cell, kind: CellKind::Node };

        let el = Element::port_group()
            .prop("name", "in")
            .prop("position", "left");
        let mut group = PortGroupInstance::create(&el.props).unwrap();
        group.insert_into(Some(owner), &mut graph).unwrap();
        assert_eq!(
            graph.prop_at(cell, "ports/groups").unwrap(),
            Some(json!({"in": {"position": "left"}}))
        );

        let renamed = Element::port_group().prop("name", "input").prop("position", "left");
        group.update(&el.props, &renamed.props, &mut graph).unwrap();
        assert_eq!(
            graph.prop_at(cell, "ports/groups").unwrap(),
            Some(json!({"input": {"position": "left"}}))
        );

        group.remove_from(&mut graph);
        assert_eq!(graph.prop_at(cell, "ports/groups").unwrap(), Some(json!({})));
    }

    #[test]
    fn name_is_required() {
        let el = Element::port_group().prop("position", "left");
        assert!(PortGroupInstance::create(&el.props).is_err());
    }
}
