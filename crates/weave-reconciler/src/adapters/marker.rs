//! Source and target markers: single-valued attributes on an edge's line.

use super::{HostInstance, Owner};
use serde_json::Value;
use weave_core::{CellId, ElementKind, Props, data_props};
use weave_engine::{CanvasEngine, CellKind};

pub struct MarkerInstance {
    kind: ElementKind,
    value: Value,
    owner: Option<CellId>,
    removed: bool,
}

impl MarkerInstance {
    pub fn create(kind: ElementKind, props: &Props) -> Self {
        Self {
            value: marker_value(props),
            kind,
            owner: None,
            removed: false,
        }
    }

    /// Attribute path under `attrs`.
    pub fn path(&self) -> &'static str {
        match self.kind {
            ElementKind::TargetMarker => "line/targetMarker",
            _ => "line/sourceMarker",
        }
    }

    fn apply(&self, engine: &mut dyn CanvasEngine, value: Value) -> Result<(), String> {
        let Some(owner) = self.owner else {
            return Ok(());
        };
        if !engine.has_cell(owner) {
            log::debug!("{}: edge {owner} is gone", self.kind);
            return Ok(());
        }
        engine.attr(owner, self.path(), value)?;
        Ok(())
    }
}

/// `{name: "block", width: 12}`; a bare `name` collapses to the string.
fn marker_value(props: &Props) -> Value {
    let mut data = data_props(props);
    data.remove("id");
    match (data.len(), data.get("name")) {
        (1, Some(Value::String(name))) => Value::from(name.as_str()),
        _ => Value::Object(data),
    }
}

impl HostInstance for MarkerInstance {
    fn kind(&self) -> &ElementKind {
        &self.kind
    }

    fn update(&mut self, _old: &Props, new: &Props, engine: &mut dyn CanvasEngine) -> Result<(), String> {
        let value = marker_value(new);
        if value == self.value {
            log::debug!("{}: data unchanged", self.kind);
            return Ok(());
        }
        self.value = value;
        if self.removed {
            return Ok(());
        }
        self.apply(engine, self.value.clone())
    }

    fn insert_into(&mut self, owner: Option<Owner>, engine: &mut dyn CanvasEngine) -> Result<(), String> {
        let Some(owner) = owner else {
            log::debug!("{}: owner has no cell yet", self.kind);
            return Ok(());
        };
        if owner.kind != CellKind::Edge {
            log::warn!("{} only attaches to edges, not {}; skipped", self.kind, owner.cell);
            return Ok(());
        }
        self.owner = Some(owner.cell);
        self.removed = false;
        self.apply(engine, self.value.clone())
    }

    fn remove_from(&mut self, engine: &mut dyn CanvasEngine) {
        if self.removed {
            return;
        }
        self.removed = true;
        if let Err(e) = self.apply(engine, Value::Null) {
            log::warn!("{}: {e}", self.kind);
        }
    }

    fn is_removed(&self) -> bool {
        self.removed
    }
}
