//! The canvas engine seam.
//!
//! Adapters only ever talk to the engine through this trait: create, read,
//! update and delete cells, manage nesting and event subscriptions, install
//! plugins. [`crate::Graph`] is the in-memory implementation; hosts that
//! drive a real renderer implement the same trait over it.

use crate::cell::{CellKind, ListSlot};
use crate::events::SubscriptionId;
use crate::plugin::{Plugin, PluginId};
use kurbo::Size;
use serde_json::Value;
use weave_core::{Callback, CellEvent, CellId, DataProps};

pub trait CanvasEngine {
    // ─── Cells ───────────────────────────────────────────────────────────

    /// Add a cell built from `spec`. An `id` in the spec is used verbatim,
    /// otherwise one is generated. Fails on duplicate ids or after dispose.
    fn add_cell(&mut self, kind: CellKind, spec: DataProps) -> Result<CellId, String>;

    /// Remove a cell together with its embedded descendants and every edge
    /// attached to a removed cell. Returns the removed ids; empty when the
    /// cell is already gone.
    fn remove_cell(&mut self, id: CellId) -> Vec<CellId>;

    fn has_cell(&self, id: CellId) -> bool;

    fn cell_kind(&self, id: CellId) -> Option<CellKind>;

    /// The cell's materialized props.
    fn props(&self, id: CellId) -> Option<&DataProps>;

    /// Set one top-level prop. Returns whether anything changed.
    fn set_prop(&mut self, id: CellId, key: &str, value: Value) -> bool;

    /// Remove one top-level prop. Returns whether anything changed.
    fn remove_prop(&mut self, id: CellId, key: &str) -> bool;

    /// Read a nested prop (`ports/items`).
    fn prop_at(&self, id: CellId, path: &str) -> Result<Option<Value>, String>;

    /// Write a nested prop. Returns whether anything changed.
    fn set_prop_at(&mut self, id: CellId, path: &str, value: Value) -> Result<bool, String>;

    /// Remove a nested prop. Returns whether anything changed.
    fn remove_prop_at(&mut self, id: CellId, path: &str) -> Result<bool, String>;

    /// Build the normalized props the engine would store for `spec`.
    fn normalize(&self, kind: CellKind, spec: &DataProps) -> DataProps;

    // ─── Nesting & endpoints ─────────────────────────────────────────────

    /// Embed `child` in `parent`. False if either is missing or the link
    /// would create a cycle.
    fn add_child(&mut self, parent: CellId, child: CellId) -> bool;

    fn parent_of(&self, id: CellId) -> Option<CellId>;

    fn children_of(&self, id: CellId) -> Vec<CellId>;

    /// The live cell an edge's source is linked to.
    fn source_of(&self, edge: CellId) -> Option<CellId>;

    /// The live cell an edge's target is linked to.
    fn target_of(&self, edge: CellId) -> Option<CellId>;

    // ─── Events ──────────────────────────────────────────────────────────

    fn on(&mut self, event: &str, handler: Callback) -> SubscriptionId;

    fn off(&mut self, subscription: SubscriptionId) -> bool;

    fn emit(&self, event: &CellEvent);

    // ─── Plugins & surface ───────────────────────────────────────────────

    fn use_plugin(&mut self, plugin: Box<dyn Plugin>) -> Result<PluginId, String>;

    /// Dispose an installed plugin. False if it was already disposed.
    fn dispose_plugin(&mut self, id: PluginId) -> bool;

    fn resize(&mut self, size: Size);

    fn dispose(&mut self);

    fn is_disposed(&self) -> bool;

    // ─── Provided ────────────────────────────────────────────────────────

    /// Set an attribute under `attrs` (`line/sourceMarker`). `null` removes.
    fn attr(&mut self, id: CellId, path: &str, value: Value) -> Result<bool, String> {
        let full = format!("attrs/{path}");
        if value.is_null() {
            self.remove_prop_at(id, &full)
        } else {
            self.set_prop_at(id, &full, value)
        }
    }

    /// Entries of a list slot; `None` when the cell is gone.
    fn entries(&self, id: CellId, slot: ListSlot) -> Option<Vec<Value>> {
        if !self.has_cell(id) {
            return None;
        }
        match self.prop_at(id, slot.path()) {
            Ok(Some(Value::Array(items))) => Some(items),
            _ => Some(Vec::new()),
        }
    }

    /// Replace the entries of a list slot.
    fn set_entries(&mut self, id: CellId, slot: ListSlot, entries: Vec<Value>) -> Result<bool, String> {
        self.set_prop_at(id, slot.path(), Value::Array(entries))
    }
}
