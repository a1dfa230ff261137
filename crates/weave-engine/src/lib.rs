pub mod cell;
pub mod engine;
pub mod events;
pub mod graph;
pub mod options;
pub mod path;
pub mod plugin;

pub use cell::{Cell, CellKind, IMMUTABLE_PROPS, Link, ListSlot, PROP_LABEL_ID, endpoint_cell, normalize};
pub use engine::CanvasEngine;
pub use events::{EventBus, SubscriptionId};
pub use graph::{EngineStats, Graph};
pub use options::GraphOptions;
pub use plugin::{
    Plugin, PluginFactory, PluginId, Selection, SelectionOptions, Snapline, SnaplineOptions,
};

// Re-export kurbo's Size so hosts sizing the canvas don't need a direct dependency
pub use kurbo::Size;
