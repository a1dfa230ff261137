//! Property paths: `ports/items`, `line/sourceMarker`, `body.fill`.
//!
//! Segments are separated by `/` or `.`. Paths address nested objects inside
//! a cell's props; writes create missing intermediate objects.

use serde_json::{Map, Value};
use winnow::combinator::separated;
use winnow::prelude::*;
use winnow::token::{one_of, take_while};

/// Parse a property path into its segments.
pub fn parse_path(input: &str) -> Result<Vec<String>, String> {
    let mut rest = input;
    let segments = parse_segments
        .parse_next(&mut rest)
        .map_err(|e| format!("Path parse error in {input:?}: {e}"))?;
    if !rest.is_empty() {
        return Err(format!("Path parse error in {input:?}: unexpected {rest:?}"));
    }
    Ok(segments)
}

fn parse_segment<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    take_while(1.., |c: char| c != '/' && c != '.').parse_next(input)
}

fn parse_segments(input: &mut &str) -> ModalResult<Vec<String>> {
    separated(1.., parse_segment.map(String::from), one_of(['/', '.'])).parse_next(input)
}

/// Read the value at `path` inside `map`.
pub fn get<'a>(map: &'a Map<String, Value>, path: &[String]) -> Option<&'a Value> {
    let (first, rest) = path.split_first()?;
    let mut current = map.get(first)?;
    for segment in rest {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Write `value` at `path`, replacing non-object intermediates with objects.
/// Returns whether the stored value changed.
pub fn set(map: &mut Map<String, Value>, path: &[String], value: Value) -> bool {
    let Some((last, parents)) = path.split_last() else {
        return false;
    };
    let mut current = map;
    for segment in parents {
        let slot = current
            .entry(segment.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        current = match slot {
            Value::Object(inner) => inner,
            _ => return false,
        };
    }
    if current.get(last) == Some(&value) {
        return false;
    }
    current.insert(last.clone(), value);
    true
}

/// Remove the value at `path`. Returns whether anything was removed.
pub fn remove(map: &mut Map<String, Value>, path: &[String]) -> bool {
    let Some((last, parents)) = path.split_last() else {
        return false;
    };
    let mut current = map;
    for segment in parents {
        current = match current.get_mut(segment) {
            Some(Value::Object(inner)) => inner,
            _ => return false,
        };
    }
    current.remove(last).is_some()
}

/// Deep-merge `src` into `dst`: objects merge key by key, everything else
/// is overwritten.
pub fn merge(dst: &mut Map<String, Value>, src: &Map<String, Value>) {
    for (key, value) in src {
        if let (Some(Value::Object(existing)), Value::Object(incoming)) = (dst.get_mut(key), value) {
            merge(existing, incoming);
            continue;
        }
        dst.insert(key.clone(), value.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn obj(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => Map::new(),
        }
    }

    #[test]
    fn parses_both_separators() {
        assert_eq!(parse_path("line/sourceMarker").unwrap(), vec!["line", "sourceMarker"]);
        assert_eq!(parse_path("body.fill").unwrap(), vec!["body", "fill"]);
        assert_eq!(parse_path("labels").unwrap(), vec!["labels"]);
    }

    #[test]
    fn rejects_empty_segments() {
        assert!(parse_path("").is_err());
        assert!(parse_path("line//x").is_err());
        assert!(parse_path("line/").is_err());
    }

    #[test]
    fn set_creates_intermediates_and_reports_change() {
        let mut map = Map::new();
        let path = parse_path("ports/groups/in").unwrap();
        assert!(set(&mut map, &path, json!({"position": "left"})));
        assert!(!set(&mut map, &path, json!({"position": "left"})));
        assert_eq!(get(&map, &path), Some(&json!({"position": "left"})));
    }

    #[test]
    fn remove_leaves_siblings() {
        let mut map = obj(json!({"line": {"stroke": "#000", "sourceMarker": "block"}}));
        assert!(remove(&mut map, &parse_path("line/sourceMarker").unwrap()));
        assert!(!remove(&mut map, &parse_path("line/sourceMarker").unwrap()));
        assert_eq!(Value::Object(map), json!({"line": {"stroke": "#000"}}));
    }

    #[test]
    fn merge_is_deep() {
        let mut dst = obj(json!({"body": {"fill": "#fff", "stroke": "#000"}}));
        merge(&mut dst, &obj(json!({"body": {"fill": "#f00"}, "text": {"text": "hi"}})));
        assert_eq!(
            Value::Object(dst),
            json!({"body": {"fill": "#f00", "stroke": "#000"}, "text": {"text": "hi"}})
        );
    }
}
