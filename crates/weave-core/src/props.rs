//! Prop/event splitting.
//!
//! Partitions an element's attributes into data props, forwarded to the
//! engine, and event handlers, subscribed on the engine's bus. An attribute
//! is a handler when its name is `on` followed by an uppercase letter; the
//! rest of the name, lower-cased, is the event name (`onClick` → `click`).

use crate::model::{Callback, PropValue, Props};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Data attributes, sorted by key.
pub type DataProps = Map<String, Value>;

/// Handlers keyed by lower-cased event name.
pub type EventHandlers = BTreeMap<String, Callback>;

/// Result of [`split`].
#[derive(Default, Clone)]
pub struct SplitProps {
    pub data: DataProps,
    pub events: EventHandlers,
}

/// Split a props bag into data props and event handlers.
pub fn split(props: &Props) -> SplitProps {
    let mut out = SplitProps::default();
    for (name, value) in props.iter() {
        match (event_name(name), value) {
            (Some(event), PropValue::Handler(handler)) => {
                out.events.insert(event, handler.clone());
            }
            (None, PropValue::Data(value)) => {
                out.data.insert(name.to_string(), value.clone());
            }
            (Some(_), PropValue::Data(_)) => {
                log::warn!("attribute {name:?} looks like a handler but holds data; dropped");
            }
            (None, PropValue::Handler(_)) => {
                log::warn!("handler under non-handler attribute {name:?}; dropped");
            }
        }
    }
    out
}

/// Data props only; cheaper than [`split`] when handlers are not needed.
pub fn data_props(props: &Props) -> DataProps {
    props
        .iter()
        .filter(|(name, _)| event_name(name).is_none())
        .filter_map(|(name, value)| match value {
            PropValue::Data(v) => Some((name.to_string(), v.clone())),
            PropValue::Handler(_) => None,
        })
        .collect()
}

/// `onClick` → `Some("click")`, `online` → `None`.
pub fn event_name(attr: &str) -> Option<String> {
    let rest = attr.strip_prefix("on")?;
    if rest.starts_with(|c: char| c.is_ascii_uppercase()) {
        Some(rest.to_lowercase())
    } else {
        None
    }
}
