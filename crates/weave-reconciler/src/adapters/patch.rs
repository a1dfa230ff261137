//! Owner prop patching that leaves child-written state alone.
//!
//! A node or edge shares parts of its props with its child elements:
//! markers write under `attrs/line`, port groups under `ports/groups`, and
//! labels, ports and tools keep entries in the list slots. An owner update
//! therefore writes object values leaf by leaf and list slots entry by
//! entry, touching only what the owner's own props declared.

use serde_json::{Map, Value};
use weave_core::{CellId, DataProps};
use weave_engine::{CanvasEngine, IMMUTABLE_PROPS, ListSlot};

/// Move `cell` from the normalized props `previous` to `next`, comparing
/// leaves against what the engine currently stores.
pub fn patch_props(
    engine: &mut dyn CanvasEngine,
    cell: CellId,
    previous: &DataProps,
    next: &DataProps,
) -> Result<(), String> {
    let current = engine.props(cell).cloned().unwrap_or_default();
    for key in union(previous, next) {
        if IMMUTABLE_PROPS.contains(&key.as_str()) {
            continue;
        }
        let path = [key.clone()];
        patch(engine, cell, &path, previous.get(&key), next.get(&key), current.get(&key))?;
    }
    Ok(())
}

fn patch(
    engine: &mut dyn CanvasEngine,
    cell: CellId,
    path: &[String],
    old: Option<&Value>,
    new: Option<&Value>,
    current: Option<&Value>,
) -> Result<(), String> {
    if let Some(slot) = ListSlot::at(&path.join("/")) {
        return patch_entries(engine, cell, slot, old, new);
    }
    let empty = Map::new();
    match (new, current) {
        (Some(Value::Object(new)), Some(Value::Object(current))) => {
            let old = old.and_then(Value::as_object).unwrap_or(&empty);
            descend(engine, cell, path, old, new, current)
        }
        (Some(value), _) => {
            if current != Some(value) {
                write(engine, cell, path, Some(value.clone()))?;
            }
            Ok(())
        }
        (None, Some(Value::Object(current))) => match old {
            Some(Value::Object(old)) => {
                descend(engine, cell, path, old, &empty, current)?;
                if let Ok(Some(Value::Object(left))) = engine.prop_at(cell, &path.join("/"))
                    && left.is_empty()
                {
                    write(engine, cell, path, None)?;
                }
                Ok(())
            }
            Some(_) => write(engine, cell, path, None),
            None => Ok(()),
        },
        (None, Some(_)) if old.is_some() => write(engine, cell, path, None),
        (None, _) => Ok(()),
    }
}

/// Patch each key of an object both sides hold. Keys that cannot be
/// addressed as a path segment are merged into the stored object instead.
fn descend(
    engine: &mut dyn CanvasEngine,
    cell: CellId,
    path: &[String],
    old: &Map<String, Value>,
    new: &Map<String, Value>,
    current: &Map<String, Value>,
) -> Result<(), String> {
    let keys = union(old, new);
    if !keys.iter().chain(path).all(|k| addressable(k)) {
        let mut merged = current.clone();
        for key in old.keys().filter(|k| !new.contains_key(*k)) {
            merged.remove(key);
        }
        merged.extend(new.iter().map(|(k, v)| (k.clone(), v.clone())));
        if &merged != current {
            write(engine, cell, path, Some(Value::Object(merged)))?;
        }
        return Ok(());
    }
    for key in keys {
        let child: Vec<String> = path.iter().cloned().chain([key.clone()]).collect();
        patch(engine, cell, &child, old.get(&key), new.get(&key), current.get(&key))?;
    }
    Ok(())
}

/// Remove the entries `old` declared that `new` no longer does, then upsert
/// every entry of `new`. Entries added by child elements are kept.
fn patch_entries(
    engine: &mut dyn CanvasEngine,
    cell: CellId,
    slot: ListSlot,
    old: Option<&Value>,
    new: Option<&Value>,
) -> Result<(), String> {
    let (old, new) = (entries(old), entries(new));
    let Some(stored) = engine.entries(cell, slot) else {
        return Ok(());
    };
    let mut next = stored.clone();
    for gone in old.iter().filter(|o| !new.iter().any(|n| same_entry(o, n))) {
        next.retain(|e| !same_entry(e, gone));
    }
    for entry in new {
        match next.iter().position(|e| same_entry(e, entry)) {
            Some(i) => next[i] = entry.clone(),
            None => next.push(entry.clone()),
        }
    }
    if next != stored {
        engine.set_entries(cell, slot, next)?;
    }
    Ok(())
}

fn entries(value: Option<&Value>) -> &[Value] {
    match value {
        Some(Value::Array(items)) => items,
        _ => &[],
    }
}

/// Entries with ids match by id; anonymous ones only by value.
fn same_entry(a: &Value, b: &Value) -> bool {
    match (a.get("id"), b.get("id")) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

fn write(engine: &mut dyn CanvasEngine, cell: CellId, path: &[String], value: Option<Value>) -> Result<(), String> {
    match (path, value) {
        ([key], Some(value)) => {
            engine.set_prop(cell, key, value);
        }
        ([key], None) => {
            engine.remove_prop(cell, key);
        }
        (_, Some(value)) => {
            engine.set_prop_at(cell, &path.join("/"), value)?;
        }
        (_, None) => {
            engine.remove_prop_at(cell, &path.join("/"))?;
        }
    }
    Ok(())
}

fn addressable(key: &str) -> bool {
    !key.is_empty() && !key.contains(['/', '.'])
}

/// Keys of `a` then the keys only `b` has.
fn union(a: &Map<String, Value>, b: &Map<String, Value>) -> Vec<String> {
    a.keys()
        .chain(b.keys().filter(|k| !a.contains_key(*k)))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use weave_engine::{CellKind, Graph};

    fn map(v: Value) -> DataProps {
        match v {
            Value::Object(m) => m,
            _ => DataProps::new(),
        }
    }

    fn edge(g: &mut Graph, id: &str, spec: Value) -> (CellId, DataProps) {
        let mut spec = map(spec);
        spec.insert("id".into(), json!(id));
        let normalized = g.normalize(CellKind::Edge, &spec);
        (g.add_cell(CellKind::Edge, spec).unwrap(), normalized)
    }

    #[test]
    fn attrs_change_keeps_sibling_leaves() {
        let mut g = Graph::default();
        let (e, old) = edge(&mut g, "pa_e", json!({"attrs": {"line": {"stroke": "#000"}}}));
        g.attr(e, "line/targetMarker", json!("classic")).unwrap();

        let new = g.normalize(CellKind::Edge, &map(json!({"id": "pa_e", "attrs": {"line": {"stroke": "#f00"}}})));
        patch_props(&mut g, e, &old, &new).unwrap();
        assert_eq!(
            g.prop_at(e, "attrs/line").unwrap(),
            Some(json!({"stroke": "#f00", "targetMarker": "classic"}))
        );
    }

    #[test]
    fn dropped_attrs_leave_child_leaves_behind() {
        let mut g = Graph::default();
        let (e, old) = edge(&mut g, "pa_drop", json!({"attrs": {"line": {"stroke": "#000"}}}));
        g.attr(e, "line/sourceMarker", json!("block")).unwrap();

        let new = g.normalize(CellKind::Edge, &map(json!({"id": "pa_drop"})));
        patch_props(&mut g, e, &old, &new).unwrap();
        assert_eq!(g.prop_at(e, "attrs").unwrap(), Some(json!({"line": {"sourceMarker": "block"}})));
    }

    #[test]
    fn emptied_objects_are_removed() {
        let mut g = Graph::default();
        let (e, old) = edge(&mut g, "pa_empty", json!({"attrs": {"line": {"stroke": "#000"}}}));
        let new = g.normalize(CellKind::Edge, &map(json!({"id": "pa_empty"})));
        patch_props(&mut g, e, &old, &new).unwrap();
        assert_eq!(g.prop_at(e, "attrs").unwrap(), None);
    }

    #[test]
    fn prop_label_is_upserted_among_child_labels() {
        let mut g = Graph::default();
        let (e, old) = edge(&mut g, "pa_l", json!({"label": "a"}));
        let mut labels = g.entries(e, ListSlot::Labels).unwrap();
        labels.push(json!({"id": "pa_child", "attrs": {"label": {"text": "child"}}}));
        g.set_entries(e, ListSlot::Labels, labels).unwrap();

        let new = g.normalize(CellKind::Edge, &map(json!({"id": "pa_l", "label": "b"})));
        patch_props(&mut g, e, &old, &new).unwrap();
        assert_eq!(
            g.entries(e, ListSlot::Labels).unwrap(),
            vec![
                json!({"id": "__label", "attrs": {"label": {"text": "b"}}}),
                json!({"id": "pa_child", "attrs": {"label": {"text": "child"}}}),
            ]
        );
    }

    #[test]
    fn prop_ports_keep_groups_and_child_ports() {
        let mut g = Graph::default();
        let mut spec = map(json!({"id": "pa_n", "ports": [{"id": "p1"}]}));
        let old = g.normalize(CellKind::Node, &spec);
        let n = g.add_cell(CellKind::Node, spec.clone()).unwrap();
        g.set_prop_at(n, "ports/groups/in", json!({"position": "left"})).unwrap();
        let mut items = g.entries(n, ListSlot::Ports).unwrap();
        items.push(json!({"id": "child"}));
        g.set_entries(n, ListSlot::Ports, items).unwrap();

        spec.insert("ports".into(), json!([{"id": "p2"}]));
        let new = g.normalize(CellKind::Node, &spec);
        patch_props(&mut g, n, &old, &new).unwrap();
        assert_eq!(
            g.prop_at(n, "ports").unwrap(),
            Some(json!({
                "groups": {"in": {"position": "left"}},
                "items": [{"id": "child"}, {"id": "p2"}]
            }))
        );
    }

    #[test]
    fn keys_with_separators_are_merged_whole() {
        let mut g = Graph::default();
        let mut spec = map(json!({"id": "pa_sep", "data": {"a.b": 1}}));
        let old = g.normalize(CellKind::Node, &spec);
        let n = g.add_cell(CellKind::Node, spec.clone()).unwrap();
        g.set_prop_at(n, "data/kept", json!(true)).unwrap();

        spec.insert("data".into(), json!({"a.b": 2}));
        let new = g.normalize(CellKind::Node, &spec);
        patch_props(&mut g, n, &old, &new).unwrap();
        assert_eq!(g.props(n).unwrap()["data"], json!({"a.b": 2, "kept": true}));
    }

    #[test]
    fn unchanged_leaves_are_not_written() {
        let mut g = Graph::default();
        let (e, old) = edge(&mut g, "pa_same", json!({"attrs": {"line": {"stroke": "#000"}}, "zIndex": 1}));
        g.attr(e, "line/targetMarker", json!("classic")).unwrap();
        let before = g.stats().props_set;

        let new = g.normalize(
            CellKind::Edge,
            &map(json!({"id": "pa_same", "attrs": {"line": {"stroke": "#000"}}, "zIndex": 2})),
        );
        patch_props(&mut g, e, &old, &new).unwrap();
        assert_eq!(g.stats().props_set, before + 1);
        assert_eq!(g.prop_at(e, "attrs/line/targetMarker").unwrap(), Some(json!("classic")));
    }
}
