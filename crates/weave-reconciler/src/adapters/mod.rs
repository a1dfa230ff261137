//! Element adapters: one per declarative element kind.
//!
//! Every adapter turns its element into a [`HostInstance`] that carries its
//! own lifecycle: update, insert under an owning instance, remove. The host
//! config only dispatches; it never inspects what an instance wraps.

pub mod cell;
pub mod label;
pub mod list;
pub mod marker;
mod patch;
pub mod plugin;
pub mod port;
pub mod port_group;
pub mod tool;

use weave_core::{CellId, ElementKind, Props};
use weave_engine::{CanvasEngine, CellKind};

pub use cell::CellInstance;
pub use list::EntryInstance;
pub use marker::MarkerInstance;
pub use plugin::PluginInstance;
pub use port_group::PortGroupInstance;

/// The cell an instance's children attach to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Owner {
    pub cell: CellId,
    pub kind: CellKind,
}

/// A live canvas instance created by an adapter.
pub trait HostInstance {
    fn kind(&self) -> &ElementKind;

    /// The cell that children of this instance attach to, if any.
    fn cell(&self) -> Option<CellId> {
        None
    }

    /// Apply a props change. Must not touch the engine when the data props
    /// are unchanged.
    fn update(&mut self, old: &Props, new: &Props, engine: &mut dyn CanvasEngine) -> Result<(), String>;

    /// Attach under an owning instance. `None` when the owner has no cell.
    /// Top-level kinds ignore this.
    fn insert_into(&mut self, owner: Option<Owner>, engine: &mut dyn CanvasEngine) -> Result<(), String> {
        let _ = (owner, engine);
        Ok(())
    }

    /// Take the instance off the canvas. Safe to call on an instance the
    /// engine already removed, and safe to call twice.
    fn remove_from(&mut self, engine: &mut dyn CanvasEngine);

    /// Release whatever `remove_from` did not.
    fn detach(&mut self, engine: &mut dyn CanvasEngine) {
        let _ = engine;
    }

    /// Whether `remove_from` already ran.
    fn is_removed(&self) -> bool;
}

/// The owner described by an instance, as seen by the engine now.
pub fn owner_of(instance: &dyn HostInstance, engine: &dyn CanvasEngine) -> Option<Owner> {
    let cell = instance.cell()?;
    let kind = engine.cell_kind(cell)?;
    Some(Owner { cell, kind })
}
