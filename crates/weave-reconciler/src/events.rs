//! Event binder: subscribes an element's handlers on the engine bus.
//!
//! Cell handlers listen on `cell:<event>` and only fire for events that
//! originate from their own cell. Graph-surface handlers listen on the same
//! names without filtering; plugin handlers listen on `<plugin>:<event>`.

use smallvec::SmallVec;
use std::rc::Rc;
use weave_core::{Callback, CellEvent, CellId, EventHandlers};
use weave_engine::{CanvasEngine, SubscriptionId};

/// Where a set of handlers listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventScope {
    /// Events of one cell.
    Cell(CellId),
    /// Every cell event on the canvas.
    Graph,
    /// Events published by a plugin, by plugin name.
    Plugin(String),
}

impl EventScope {
    /// Bus event name for handler event `event`.
    pub fn bus_event(&self, event: &str) -> String {
        match self {
            EventScope::Cell(_) | EventScope::Graph => format!("cell:{event}"),
            EventScope::Plugin(name) => format!("{name}:{event}"),
        }
    }

    fn target(&self) -> Option<CellId> {
        match self {
            EventScope::Cell(id) => Some(*id),
            _ => None,
        }
    }
}

/// Live subscriptions of one instance. Disposing twice is a no-op.
#[derive(Debug, Default)]
pub struct Binding {
    subscriptions: SmallVec<[SubscriptionId; 4]>,
}

impl Binding {
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Unsubscribe every handler.
    pub fn dispose(&mut self, engine: &mut dyn CanvasEngine) {
        for subscription in self.subscriptions.drain(..) {
            engine.off(subscription);
        }
    }

    /// Dispose the current handlers, then bind `handlers` in their place.
    pub fn rebind(&mut self, scope: &EventScope, handlers: &EventHandlers, engine: &mut dyn CanvasEngine) {
        self.dispose(engine);
        *self = bind(scope, handlers, engine);
    }
}

/// Subscribe `handlers` under `scope`.
pub fn bind(scope: &EventScope, handlers: &EventHandlers, engine: &mut dyn CanvasEngine) -> Binding {
    let mut subscriptions = SmallVec::new();
    for (event, handler) in handlers {
        let callback: Callback = match scope.target() {
            Some(target) => {
                let handler = handler.clone();
                Rc::new(move |e: &CellEvent| {
                    if e.cell == Some(target) {
                        handler(e);
                    }
                })
            }
            None => handler.clone(),
        };
        subscriptions.push(engine.on(&scope.bus_event(event), callback));
    }
    Binding { subscriptions }
}
