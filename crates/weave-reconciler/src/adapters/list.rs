//! Id-keyed list entries living inside an owning cell: labels, ports, tools.
//!
//! Entries are matched by id. A miss appends, a hit replaces in place, and
//! a `None` payload removes. The owner is only known once the instance is
//! inserted, so nothing reaches the engine before that.

use super::{HostInstance, Owner};
use serde_json::Value;
use weave_core::{CellId, DataProps, ElementKind, Props, data_props};
use weave_engine::{CanvasEngine, CellKind, ListSlot};

/// How one kind of list entry maps onto its owner.
#[derive(Debug, Clone, Copy)]
pub struct EntrySpec {
    pub slot: ListSlot,
    /// Owner kind the entry is valid on.
    pub owner: CellKind,
    /// Build the stored entry from the element's data props.
    pub build: fn(CellId, &DataProps) -> Value,
}

/// Upsert (`Some`) or remove (`None`) entry `id` in `owner`'s `slot`.
/// Returns false when the owner is no longer on the canvas.
pub fn apply_entry(
    engine: &mut dyn CanvasEngine,
    owner: CellId,
    slot: ListSlot,
    id: CellId,
    entry: Option<Value>,
) -> Result<bool, String> {
    let Some(mut entries) = engine.entries(owner, slot) else {
        return Ok(false);
    };
    let position = entries.iter().position(|e| entry_id(e) == Some(id));
    match (position, entry) {
        (Some(i), Some(value)) => {
            if entries[i] == value {
                return Ok(true);
            }
            entries[i] = value;
        }
        (None, Some(value)) => entries.push(value),
        (Some(i), None) => {
            entries.remove(i);
        }
        (None, None) => return Ok(true),
    }
    engine.set_entries(owner, slot, entries)?;
    Ok(true)
}

/// The element's data props as declared, with the resolved id.
pub fn plain_entry(id: CellId, data: &DataProps) -> Value {
    let mut entry = data.clone();
    entry.insert("id".into(), Value::from(id.as_str()));
    Value::Object(entry)
}

fn entry_id(entry: &Value) -> Option<CellId> {
    match entry.get("id")? {
        Value::String(s) => Some(CellId::intern(s)),
        Value::Number(n) => Some(CellId::intern(&n.to_string())),
        _ => None,
    }
}

pub struct EntryInstance {
    kind: ElementKind,
    spec: EntrySpec,
    id: CellId,
    data: DataProps,
    owner: Option<CellId>,
    removed: bool,
}

impl EntryInstance {
    pub fn create(kind: ElementKind, spec: EntrySpec, props: &Props) -> Self {
        let data = data_props(props);
        if data.len() < props.len() {
            log::debug!("{kind}: handlers are not supported on list entries; ignored");
        }
        Self {
            kind,
            spec,
            id: props.id().unwrap_or_else(CellId::generate),
            data,
            owner: None,
            removed: false,
        }
    }

    pub fn id(&self) -> CellId {
        self.id
    }

    pub fn owner(&self) -> Option<CellId> {
        self.owner
    }

    fn apply(&self, engine: &mut dyn CanvasEngine) -> Result<(), String> {
        let Some(owner) = self.owner else {
            return Ok(());
        };
        let entry = (self.spec.build)(self.id, &self.data);
        if !apply_entry(engine, owner, self.spec.slot, self.id, Some(entry))? {
            log::debug!("{} {}: owner {owner} is gone", self.kind, self.id);
        }
        Ok(())
    }
}

impl HostInstance for EntryInstance {
    fn kind(&self) -> &ElementKind {
        &self.kind
    }

    fn update(&mut self, _old: &Props, new: &Props, engine: &mut dyn CanvasEngine) -> Result<(), String> {
        let data = data_props(new);
        if data == self.data {
            log::debug!("{} {}: data unchanged", self.kind, self.id);
            return Ok(());
        }
        self.data = data;
        if self.removed {
            return Ok(());
        }
        self.apply(engine)
    }

    fn insert_into(&mut self, owner: Option<Owner>, engine: &mut dyn CanvasEngine) -> Result<(), String> {
        let Some(owner) = owner else {
            log::debug!("{} {}: owner has no cell yet", self.kind, self.id);
            return Ok(());
        };
        if owner.kind != self.spec.owner {
            log::warn!(
                "{} {} cannot attach to a {:?} ({}); skipped",
                self.kind,
                self.id,
                owner.kind,
                owner.cell
            );
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
        match apply_entry(engine, owner, self.spec.slot, self.id, None) {
            Ok(true) => log::trace!("{} {} removed from {owner}", self.kind, self.id),
            Ok(false) => log::debug!("{} {}: owner {owner} already gone", self.kind, self.id),
            Err(e) => log::warn!("{} {}: {e}", self.kind, self.id),
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
    use weave_engine::Graph;

    fn edge(graph: &mut Graph, id: &str) -> CellId {
        let mut spec = DataProps::new();
        spec.insert("id".into(), json!(id));
        graph.add_cell(CellKind::Edge, spec).unwrap()
    }

    fn ids(graph: &Graph, owner: CellId) -> Vec<Value> {
        graph
            .entries(owner, ListSlot::Tools)
            .unwrap()
            .iter()
            .map(|e| e["id"].clone())
            .collect()
    }

    #[test]
    fn upsert_appends_on_miss_and_replaces_on_hit() {
        let mut graph = Graph::default();
        let owner = edge(&mut graph, "li_e");
        let (a, b) = (CellId::intern("li_a"), CellId::intern("li_b"));

        apply_entry(&mut graph, owner, ListSlot::Tools, a, Some(json!({"id": "li_a", "v": 1}))).unwrap();
        apply_entry(&mut graph, owner, ListSlot::Tools, b, Some(json!({"id": "li_b"}))).unwrap();
        apply_entry(&mut graph, owner, ListSlot::Tools, a, Some(json!({"id": "li_a", "v": 2}))).unwrap();
        assert_eq!(ids(&graph, owner), vec![json!("li_a"), json!("li_b")]);
        assert_eq!(graph.entries(owner, ListSlot::Tools).unwrap()[0]["v"], json!(2));

        apply_entry(&mut graph, owner, ListSlot::Tools, a, None).unwrap();
        assert_eq!(ids(&graph, owner), vec![json!("li_b")]);
    }

    #[test]
    fn unchanged_entry_is_not_written() {
        let mut graph = Graph::default();
        let owner = edge(&mut graph, "li_same");
        let a = CellId::intern("li_same_a");
        apply_entry(&mut graph, owner, ListSlot::Tools, a, Some(json!({"id": "li_same_a"}))).unwrap();
        let before = graph.stats();
        apply_entry(&mut graph, owner, ListSlot::Tools, a, Some(json!({"id": "li_same_a"}))).unwrap();
        assert_eq!(graph.stats(), before);
    }

    #[test]
    fn missing_owner_reports_false() {
        let mut graph = Graph::default();
        let gone = CellId::intern("li_nobody");
        let applied = apply_entry(&mut graph, gone, ListSlot::Labels, gone, None).unwrap();
        assert!(!applied);
    }
}
