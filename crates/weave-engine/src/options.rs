//! Graph construction options, read from the graph surface's data props.

use kurbo::Size;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use weave_core::DataProps;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphOptions {
    pub width: f64,
    pub height: f64,
    /// `true`, a color string, or an engine background spec.
    pub background: Option<Value>,
    /// `true`, a grid size, or an engine grid spec.
    pub grid: Option<Value>,
    /// Options this engine does not interpret but keeps for hosts.
    #[serde(flatten)]
    pub extra: DataProps,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            background: None,
            grid: None,
            extra: DataProps::new(),
        }
    }
}

impl GraphOptions {
    pub fn from_props(data: &DataProps) -> Result<Self, String> {
        serde_json::from_value(Value::Object(data.clone()))
            .map_err(|e| format!("Invalid graph options: {e}"))
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}
