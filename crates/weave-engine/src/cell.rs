//! Cells: the engine-side objects nodes and edges materialize into.
//!
//! A cell's props are the full normalized property map the engine works
//! from. [`normalize`] turns declarative data props into that shape; the
//! reconciler diffs against it to apply minimal updates.

use crate::path;
use serde_json::{Map, Value, json};
use weave_core::{CellId, DataProps};

/// Node or edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellKind {
    Node,
    Edge,
}

impl CellKind {
    pub fn default_shape(self) -> &'static str {
        match self {
            CellKind::Node => "rect",
            CellKind::Edge => "edge",
        }
    }
}

/// One cell in the engine's model.
#[derive(Debug, Clone)]
pub struct Cell {
    pub id: CellId,
    pub kind: CellKind,
    pub props: DataProps,
}

impl Cell {
    pub fn shape(&self) -> &str {
        self.props
            .get("shape")
            .and_then(Value::as_str)
            .unwrap_or(self.kind.default_shape())
    }
}

/// Relation between two cells in the engine graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Link {
    /// Visual nesting: parent → child.
    Child,
    /// Edge cell → its source cell.
    Source,
    /// Edge cell → its target cell.
    Target,
}

/// Id-keyed list slots living inside a cell's props.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListSlot {
    Labels,
    Ports,
    Tools,
}

impl ListSlot {
    pub const ALL: [ListSlot; 3] = [ListSlot::Labels, ListSlot::Ports, ListSlot::Tools];

    /// The slot stored at `path`, if any.
    pub fn at(path: &str) -> Option<ListSlot> {
        Self::ALL.into_iter().find(|slot| slot.path() == path)
    }

    /// Props path holding the list.
    pub fn path(self) -> &'static str {
        match self {
            ListSlot::Labels => "labels",
            ListSlot::Ports => "ports/items",
            ListSlot::Tools => "tools",
        }
    }
}

/// Id of the label entry an edge's own `label` prop becomes, so updates
/// can find it among labels added by child elements.
pub const PROP_LABEL_ID: &str = "__label";

/// Keys that never change once a cell exists.
pub const IMMUTABLE_PROPS: [&str; 3] = ["id", "parent", "shape"];

/// Build the normalized prop map the engine stores for `spec`.
///
/// - `x`/`y` → `position`, `width`/`height` → `size`
/// - node `label` → `attrs.text.text`, edge `label` → a single label entry
/// - edge `source`/`target` ids → `{cell: id}`
/// - node `ports` arrays → `{items: [...]}`
/// - `attrs` are deep-merged; `shape` defaults per kind
/// - `parent` is dropped: nesting is a link, not a prop
///
/// List slots get no defaults, so entries managed elsewhere survive.
pub fn normalize(kind: CellKind, spec: &DataProps) -> DataProps {
    let mut out = Map::new();
    let mut attrs = Map::new();

    for (key, value) in spec {
        match key.as_str() {
            "x" | "y" => {
                set_nested(&mut out, "position", key, value.clone());
            }
            "width" | "height" => {
                set_nested(&mut out, "size", key, value.clone());
            }
            "parent" | "children" => {}
            "attrs" => {
                if let Value::Object(given) = value {
                    path::merge(&mut attrs, given);
                }
            }
            "label" if kind == CellKind::Node => {}
            "label" => {
                out.insert(
                    "labels".into(),
                    json!([{ "id": PROP_LABEL_ID, "attrs": { "label": { "text": value } } }]),
                );
            }
            "source" | "target" if kind == CellKind::Edge => {
                out.insert(key.clone(), endpoint(value));
            }
            "ports" if kind == CellKind::Node => {
                let ports = match value {
                    Value::Array(items) => json!({ "items": items }),
                    other => other.clone(),
                };
                out.insert(key.clone(), ports);
            }
            _ => {
                out.insert(key.clone(), value.clone());
            }
        }
    }

    if kind == CellKind::Node
        && let Some(label) = spec.get("label")
    {
        let mut text = Map::new();
        text.insert("text".into(), json!({ "text": label }));
        path::merge(&mut attrs, &text);
    }
    if !attrs.is_empty() {
        out.insert("attrs".into(), Value::Object(attrs));
    }
    if !out.contains_key("shape") {
        out.insert("shape".into(), Value::from(kind.default_shape()));
    }
    out
}

fn set_nested(out: &mut DataProps, outer: &str, inner: &str, value: Value) {
    let slot = out
        .entry(outer.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if let Value::Object(map) = slot {
        map.insert(inner.to_string(), value);
    }
}

/// `"1"` → `{cell: "1"}`; objects (cell + port, or a point) pass through.
fn endpoint(value: &Value) -> Value {
    match value {
        Value::String(id) => json!({ "cell": id }),
        Value::Number(n) => json!({ "cell": n.to_string() }),
        other => other.clone(),
    }
}

/// The cell id an endpoint value refers to, if any.
pub fn endpoint_cell(value: &Value) -> Option<CellId> {
    value
        .get("cell")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(CellId::intern)
}
