//! Graph-wide plugins.
//!
//! A plugin is installed once with [`crate::CanvasEngine::use_plugin`] and
//! disposed once; its options are fixed at construction.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use weave_core::DataProps;

/// Handle returned when a plugin is installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PluginId(pub(crate) u64);

pub trait Plugin {
    /// Plugin name, also the namespace of its bus events (`selection:*`).
    fn name(&self) -> &str;

    /// Called when the plugin is installed on a graph.
    fn init(&mut self) {}

    /// Release everything the plugin holds. Called exactly once.
    fn dispose(&mut self);

    /// Current options, for inspection.
    fn options(&self) -> Value;
}

/// Constructor for a plugin from its element's data props.
pub type PluginFactory = fn(&DataProps) -> Result<Box<dyn Plugin>, String>;

fn from_props<T: for<'de> Deserialize<'de>>(name: &str, data: &DataProps) -> Result<T, String> {
    serde_json::from_value(Value::Object(data.clone()))
        .map_err(|e| format!("Invalid {name} options: {e}"))
}

// ─── Snapline ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SnaplineOptions {
    pub enabled: bool,
    pub tolerance: f64,
    pub sharp: bool,
}

impl Default for SnaplineOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            tolerance: 10.0,
            sharp: false,
        }
    }
}

/// Alignment guides shown while dragging nodes.
#[derive(Debug)]
pub struct Snapline {
    pub options: SnaplineOptions,
    active: bool,
}

impl Snapline {
    pub fn new(options: SnaplineOptions) -> Self {
        Self {
            options,
            active: false,
        }
    }

    pub fn create(data: &DataProps) -> Result<Box<dyn Plugin>, String> {
        Ok(Box::new(Self::new(from_props("Snapline", data)?)))
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

impl Plugin for Snapline {
    fn name(&self) -> &str {
        "snapline"
    }

    fn init(&mut self) {
        self.active = self.options.enabled;
    }

    fn dispose(&mut self) {
        self.active = false;
    }

    fn options(&self) -> Value {
        serde_json::to_value(&self.options).unwrap_or(Value::Null)
    }
}

// ─── Selection ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SelectionOptions {
    pub enabled: bool,
    pub multiple: bool,
    pub rubberband: bool,
    pub show_node_selection_box: bool,
}

impl Default for SelectionOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            multiple: true,
            rubberband: false,
            show_node_selection_box: false,
        }
    }
}

/// Cell selection with optional rubberband.
#[derive(Debug)]
pub struct Selection {
    pub options: SelectionOptions,
    active: bool,
}

impl Selection {
    pub fn new(options: SelectionOptions) -> Self {
        Self {
            options,
            active: false,
        }
    }

    pub fn create(data: &DataProps) -> Result<Box<dyn Plugin>, String> {
        Ok(Box::new(Self::new(from_props("Selection", data)?)))
    }
}

impl Plugin for Selection {
    fn name(&self) -> &str {
        "selection"
    }

    fn init(&mut self) {
        self.active = self.options.enabled;
    }

    fn dispose(&mut self) {
        self.active = false;
    }

    fn options(&self) -> Value {
        serde_json::to_value(&self.options).unwrap_or(Value::Null)
    }
}

/// Built-in plugin constructors by element name.
pub fn builtin(name: &str) -> Option<PluginFactory> {
    match name {
        "Snapline" => Some(Snapline::create),
        "Selection" => Some(Selection::create),
        _ => None,
    }
}
