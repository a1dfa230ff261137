//! Edge labels.

use super::list::{EntryInstance, EntrySpec};
use serde_json::{Map, Value};
use weave_core::{CellId, DataProps, ElementKind, Props};
use weave_engine::{CellKind, ListSlot, path};

pub const LABEL: EntrySpec = EntrySpec {
    slot: ListSlot::Labels,
    owner: CellKind::Edge,
    build: label_entry,
};

pub fn create(props: &Props) -> EntryInstance {
    EntryInstance::create(ElementKind::Label, LABEL, props)
}

/// `{id, text, distance, ..}` → `{id, attrs: {label: {text}}, position: {distance}, ..}`.
pub fn label_entry(id: CellId, data: &DataProps) -> Value {
    let mut entry = Map::new();
    for (key, value) in data {
        if !matches!(key.as_str(), "id" | "text" | "distance") {
            entry.insert(key.clone(), value.clone());
        }
    }
    entry.insert("id".into(), Value::from(id.as_str()));

    if let Some(text) = data.get("text") {
        path::set(&mut entry, &segments(&["attrs", "label", "text"]), text.clone());
    }
    if let Some(distance) = data.get("distance") {
        path::set(&mut entry, &segments(&["position", "distance"]), distance.clone());
    }
    Value::Object(entry)
}

fn segments(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|p| p.to_string()).collect()
}
