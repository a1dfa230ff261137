//! Engine event bus.
//!
//! Handlers subscribe by full event name (`cell:click`) and get a
//! `SubscriptionId` back for unsubscription. Emission snapshots the matching
//! handlers before calling them, so a handler may not observe subscriptions
//! made during the same emission.

use weave_core::{Callback, CellEvent};

/// Handle returned by [`EventBus::on`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscription {
    id: SubscriptionId,
    event: String,
    handler: Callback,
}

#[derive(Default)]
pub struct EventBus {
    subscriptions: Vec<Subscription>,
    next_id: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&mut self, event: &str, handler: Callback) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscriptions.push(Subscription {
            id,
            event: event.to_string(),
            handler,
        });
        id
    }

    /// Remove a subscription. Returns false if it was already gone.
    pub fn off(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.id != id);
        self.subscriptions.len() != before
    }

    /// Deliver `event` to every handler subscribed to its name, in
    /// subscription order.
    pub fn emit(&self, event: &CellEvent) {
        let handlers: Vec<Callback> = self
            .subscriptions
            .iter()
            .filter(|s| s.event == event.name)
            .map(|s| s.handler.clone())
            .collect();
        for handler in handlers {
            handler(event);
        }
    }

    /// Number of live subscriptions for `event`.
    pub fn listener_count(&self, event: &str) -> usize {
        self.subscriptions.iter().filter(|s| s.event == event).count()
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    pub fn clear(&mut self) {
        self.subscriptions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn emit_reaches_matching_handlers_only() {
        let mut bus = EventBus::new();
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        bus.on("cell:click", Rc::new(move |_: &CellEvent| h.set(h.get() + 1)));
        bus.on("cell:dblclick", Rc::new(|_: &CellEvent| panic!("wrong event")));

        bus.emit(&CellEvent::new("cell:click", None, Value::Null));
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn off_is_idempotent() {
        let mut bus = EventBus::new();
        let id = bus.on("cell:click", Rc::new(|_: &CellEvent| {}));
        assert!(bus.off(id));
        assert!(!bus.off(id));
        assert!(bus.is_empty());
    }
}
