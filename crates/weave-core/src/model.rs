//! Declarative element model.
//!
//! An `Element` is one node of the declarative tree a host application
//! renders: a kind tag, an optional reconciliation key, a props bag and
//! nested children. Props hold either plain data (forwarded to the engine)
//! or handler callbacks (bound on the engine's event bus). Elements carry
//! no engine state; they are compared and hashed, never mutated in place
//! by the reconciler.

use crate::id::CellId;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

// ─── Events ──────────────────────────────────────────────────────────────

/// An event emitted on the engine's bus, e.g. `cell:click`.
#[derive(Debug, Clone, PartialEq)]
pub struct CellEvent {
    /// Full bus name (`cell:click`, `cell:removed`, `selection:changed`).
    pub name: String,
    /// The cell the event originated from, if any.
    pub cell: Option<CellId>,
    /// Event payload.
    pub data: Value,
}

impl CellEvent {
    pub fn new(name: impl Into<String>, cell: Option<CellId>, data: Value) -> Self {
        Self {
            name: name.into(),
            cell,
            data,
        }
    }
}

/// A declarative event handler. Single-threaded: the whole commit runs on
/// one execution context.
pub type Callback = Rc<dyn Fn(&CellEvent)>;

// ─── Props ───────────────────────────────────────────────────────────────

/// One attribute value in a props bag.
#[derive(Clone)]
pub enum PropValue {
    Data(Value),
    Handler(Callback),
}

impl PartialEq for PropValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PropValue::Data(a), PropValue::Data(b)) => a == b,
            (PropValue::Handler(a), PropValue::Handler(b)) => {
                std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
            }
            _ => false,
        }
    }
}

impl fmt::Debug for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Data(v) => write!(f, "{v}"),
            PropValue::Handler(_) => f.write_str("<handler>"),
        }
    }
}

/// The attribute bag of one element. Keys are sorted, so iteration and
/// serialization are order-independent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Props(BTreeMap<String, PropValue>);

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a data attribute.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(name.into(), PropValue::Data(value.into()));
    }

    /// Set a handler attribute under its full name (`onClick`).
    pub fn set_handler(&mut self, name: impl Into<String>, handler: Callback) {
        self.0.insert(name.into(), PropValue::Handler(handler));
    }

    pub fn get(&self, name: &str) -> Option<&PropValue> {
        self.0.get(name)
    }

    /// Data value of an attribute; `None` for handlers and absent keys.
    pub fn data(&self, name: &str) -> Option<&Value> {
        match self.0.get(name) {
            Some(PropValue::Data(v)) => Some(v),
            _ => None,
        }
    }

    /// The explicit `id` attribute, if declared as a string or number.
    pub fn id(&self) -> Option<CellId> {
        match self.data("id")? {
            Value::String(s) if !s.is_empty() => Some(CellId::intern(s)),
            Value::Number(n) => Some(CellId::intern(&n.to_string())),
            _ => None,
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<PropValue> {
        self.0.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Props {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut props = Props::new();
        for (k, v) in iter {
            props.set(k, v);
        }
        props
    }
}

// ─── Element kinds ───────────────────────────────────────────────────────

/// Element kinds understood by the adapter registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementKind {
    /// The canvas surface itself; only valid as a root.
    Graph,
    Node,
    Edge,
    Label,
    SourceMarker,
    TargetMarker,
    PortGroup,
    Port,
    NodeTool,
    EdgeTool,
    /// Graph-wide extension, named by the plugin (`Snapline`, `Selection`).
    Plugin(String),
    /// Kind registered by the host application with its own adapter.
    Custom(String),
}

impl ElementKind {
    /// Stable tag used in hashing and logs.
    pub fn tag(&self) -> &str {
        match self {
            ElementKind::Graph => "Graph",
            ElementKind::Node => "Node",
            ElementKind::Edge => "Edge",
            ElementKind::Label => "Label",
            ElementKind::SourceMarker => "SourceMarker",
            ElementKind::TargetMarker => "TargetMarker",
            ElementKind::PortGroup => "PortGroup",
            ElementKind::Port => "Port",
            ElementKind::NodeTool => "NodeTool",
            ElementKind::EdgeTool => "EdgeTool",
            ElementKind::Plugin(name) | ElementKind::Custom(name) => name,
        }
    }

    /// Edges can vanish engine-side when an endpoint is removed, so an
    /// unidentified edge never reuses a previously minted key.
    pub fn is_edge_like(&self) -> bool {
        matches!(self, ElementKind::Edge)
    }

    /// Kinds whose resolved key doubles as the engine-side `id` attribute.
    pub fn carries_id(&self) -> bool {
        matches!(
            self,
            ElementKind::Node
                | ElementKind::Edge
                | ElementKind::Label
                | ElementKind::Port
                | ElementKind::NodeTool
                | ElementKind::EdgeTool
        )
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

// ─── Elements ────────────────────────────────────────────────────────────

/// One declarative tree node.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub kind: ElementKind,
    /// Reconciliation key. Filled in by the identity resolver.
    pub key: Option<CellId>,
    pub props: Props,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(kind: ElementKind) -> Self {
        Self {
            kind,
            key: None,
            props: Props::new(),
            children: Vec::new(),
        }
    }

    pub fn graph() -> Self {
        Self::new(ElementKind::Graph)
    }

    pub fn node() -> Self {
        Self::new(ElementKind::Node)
    }

    pub fn edge() -> Self {
        Self::new(ElementKind::Edge)
    }

    pub fn label() -> Self {
        Self::new(ElementKind::Label)
    }

    pub fn source_marker() -> Self {
        Self::new(ElementKind::SourceMarker)
    }

    pub fn target_marker() -> Self {
        Self::new(ElementKind::TargetMarker)
    }

    pub fn port_group() -> Self {
        Self::new(ElementKind::PortGroup)
    }

    pub fn port() -> Self {
        Self::new(ElementKind::Port)
    }

    pub fn node_tool() -> Self {
        Self::new(ElementKind::NodeTool)
    }

    pub fn edge_tool() -> Self {
        Self::new(ElementKind::EdgeTool)
    }

    pub fn plugin(name: impl Into<String>) -> Self {
        Self::new(ElementKind::Plugin(name.into()))
    }

    pub fn custom(tag: impl Into<String>) -> Self {
        Self::new(ElementKind::Custom(tag.into()))
    }

    /// Declare an explicit `id`.
    pub fn id(mut self, id: &str) -> Self {
        self.props.set("id", id);
        self
    }

    /// Set an explicit reconciliation key.
    pub fn key(mut self, key: &str) -> Self {
        self.key = Some(CellId::intern(key));
        self
    }

    /// Set a data attribute.
    pub fn prop(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.props.set(name, value);
        self
    }

    /// Attach a handler for `event`, stored as `on<Event>`.
    pub fn on(mut self, event: &str, handler: impl Fn(&CellEvent) + 'static) -> Self {
        self.props.set_handler(handler_attr_name(event), Rc::new(handler));
        self
    }

    /// Attach an already shared handler, keeping its identity.
    pub fn on_shared(mut self, event: &str, handler: Callback) -> Self {
        self.props.set_handler(handler_attr_name(event), handler);
        self
    }

    pub fn child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = Element>) -> Self {
        self.children.extend(children);
        self
    }
}

/// `click` → `onClick`.
fn handler_attr_name(event: &str) -> String {
    let mut chars = event.chars();
    match chars.next() {
        Some(first) => format!("on{}{}", first.to_ascii_uppercase(), chars.as_str()),
        None => "on".to_string(),
    }
}
