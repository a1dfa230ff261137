//! Node and edge adapter.
//!
//! Cells are top-level: they are added to the engine model on creation and
//! ignore insertion. Nesting comes from the `parent` prop instead.

use super::HostInstance;
use super::patch::patch_props;
use crate::events::{Binding, EventScope, bind};
use serde_json::Value;
use weave_core::{CellId, ElementKind, Props, SplitProps, split};
use weave_engine::{CanvasEngine, CellKind};

pub struct CellInstance {
    kind: ElementKind,
    cell_kind: CellKind,
    id: CellId,
    binding: Binding,
    removed: bool,
}

impl CellInstance {
    pub fn create(kind: ElementKind, props: &Props, engine: &mut dyn CanvasEngine) -> Result<Self, String> {
        let cell_kind = match kind {
            ElementKind::Edge => CellKind::Edge,
            _ => CellKind::Node,
        };
        let SplitProps { mut data, events } = split(props);
        let id = props.id().unwrap_or_else(CellId::generate);
        data.insert("id".into(), Value::from(id.as_str()));
        let parent = data.get("parent").and_then(parent_id);

        // Bound before the cell exists so `added` handlers see its creation.
        let mut binding = bind(&EventScope::Cell(id), &events, engine);
        if let Err(e) = engine.add_cell(cell_kind, data) {
            binding.dispose(engine);
            return Err(e);
        }
        log::trace!("{kind} {id} created");

        if let Some(parent) = parent {
            if engine.has_cell(parent) {
                engine.add_child(parent, id);
            } else {
                log::debug!("{kind} {id}: parent {parent} not on the canvas; not nested");
            }
        }

        Ok(Self {
            kind,
            cell_kind,
            id,
            binding,
            removed: false,
        })
    }

    pub fn id(&self) -> CellId {
        self.id
    }

    /// Number of live event subscriptions.
    pub fn bound_events(&self) -> usize {
        self.binding.len()
    }
}

fn parent_id(value: &Value) -> Option<CellId> {
    match value {
        Value::String(s) if !s.is_empty() => Some(CellId::intern(s)),
        Value::Number(n) => Some(CellId::intern(&n.to_string())),
        _ => None,
    }
}

impl HostInstance for CellInstance {
    fn kind(&self) -> &ElementKind {
        &self.kind
    }

    fn cell(&self) -> Option<CellId> {
        Some(self.id)
    }

    fn update(&mut self, old: &Props, new: &Props, engine: &mut dyn CanvasEngine) -> Result<(), String> {
        if self.removed || !engine.has_cell(self.id) {
            log::debug!("{} {}: update on removed cell skipped", self.kind, self.id);
            return Ok(());
        }
        let before = split(old);
        let after = split(new);

        if before.data == after.data {
            log::debug!("{} {}: data unchanged", self.kind, self.id);
        } else {
            let previous = engine.normalize(self.cell_kind, &before.data);
            let next = engine.normalize(self.cell_kind, &after.data);
            patch_props(engine, self.id, &previous, &next)?;
            log::trace!("{} {} updated", self.kind, self.id);
        }

        // Handlers are closures; their identity changes almost every render.
        self.binding
            .rebind(&EventScope::Cell(self.id), &after.events, engine);
        Ok(())
    }

    fn remove_from(&mut self, engine: &mut dyn CanvasEngine) {
        if self.removed {
            log::debug!("{} {} already removed", self.kind, self.id);
            return;
        }
        self.removed = true;
        self.binding.dispose(engine);
        if engine.remove_cell(self.id).is_empty() {
            log::debug!("{} {} was already gone from the canvas", self.kind, self.id);
        } else {
            log::trace!("{} {} removed", self.kind, self.id);
        }
    }

    fn detach(&mut self, engine: &mut dyn CanvasEngine) {
        self.binding.dispose(engine);
    }

    fn is_removed(&self) -> bool {
        self.removed
    }
}
