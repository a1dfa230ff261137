//! In-memory canvas engine.
//!
//! Cells live in a `StableDiGraph` so indices survive removals. Graph edges
//! carry the relations between cells: `Child` for visual nesting
//! (parent → child) and `Source`/`Target` for edge endpoints
//! (edge cell → endpoint cell). Removing a cell walks those relations to
//! take embedded children and attached edges with it.

use crate::cell::{self, Cell, CellKind, Link};
use crate::engine::CanvasEngine;
use crate::events::{EventBus, SubscriptionId};
use crate::options::GraphOptions;
use crate::path;
use crate::plugin::{Plugin, PluginId};
use kurbo::Size;
use petgraph::Direction;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use serde_json::{Value, json};
use std::collections::{HashMap, HashSet};
use weave_core::{Callback, CellEvent, CellId, DataProps};

/// Mutation counters. Subscriptions are not mutations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    pub cells_added: usize,
    pub cells_removed: usize,
    pub props_set: usize,
    pub links: usize,
    pub plugins_installed: usize,
    pub plugins_disposed: usize,
    pub resizes: usize,
}

impl EngineStats {
    /// Total number of model mutations.
    pub fn mutations(&self) -> usize {
        self.cells_added
            + self.cells_removed
            + self.props_set
            + self.links
            + self.plugins_installed
            + self.plugins_disposed
            + self.resizes
    }
}

pub struct Graph {
    options: GraphOptions,
    size: Size,
    cells: StableDiGraph<Cell, Link>,
    index: HashMap<CellId, NodeIndex>,
    /// Insertion order of live cells.
    order: Vec<CellId>,
    bus: EventBus,
    plugins: Vec<(PluginId, Box<dyn Plugin>)>,
    next_plugin: u64,
    stats: EngineStats,
    disposed: bool,
}

impl Graph {
    pub fn new(options: GraphOptions) -> Self {
        log::debug!("graph created {}x{}", options.width, options.height);
        Self {
            size: options.size(),
            options,
            cells: StableDiGraph::new(),
            index: HashMap::new(),
            order: Vec::new(),
            bus: EventBus::new(),
            plugins: Vec::new(),
            next_plugin: 0,
            stats: EngineStats::default(),
            disposed: false,
        }
    }

    pub fn options(&self) -> &GraphOptions {
        &self.options
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    pub fn cell(&self, id: CellId) -> Option<&Cell> {
        self.index.get(&id).map(|idx| &self.cells[*idx])
    }

    /// Live cells in insertion order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.order.iter().filter_map(|id| self.cell(*id))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn plugin(&self, id: PluginId) -> Option<&dyn Plugin> {
        self.plugins
            .iter()
            .find(|(pid, _)| *pid == id)
            .map(|(_, p)| p.as_ref())
    }

    pub fn plugin_count(&self) -> usize {
        self.plugins.len()
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.bus.listener_count(event)
    }

    /// Fire an event on the bus, as user interaction would.
    pub fn trigger(&self, name: &str, cell: Option<CellId>, data: Value) {
        self.bus.emit(&CellEvent::new(name, cell, data));
    }

    /// Whether `ancestor` contains `descendant` through nesting links.
    pub fn is_ancestor_of(&self, ancestor: CellId, descendant: CellId) -> bool {
        let mut current = descendant;
        while let Some(parent) = self.parent_of(current) {
            if parent == ancestor {
                return true;
            }
            current = parent;
        }
        false
    }

    fn relink_endpoints(&mut self, idx: NodeIndex) {
        let stale: Vec<_> = self
            .cells
            .edges_directed(idx, Direction::Outgoing)
            .filter(|e| matches!(e.weight(), Link::Source | Link::Target))
            .map(|e| e.id())
            .collect();
        for edge in stale {
            self.cells.remove_edge(edge);
        }

        for (field, link) in [("source", Link::Source), ("target", Link::Target)] {
            let Some(endpoint) = self.cells[idx].props.get(field).and_then(cell::endpoint_cell)
            else {
                continue;
            };
            match self.index.get(&endpoint) {
                Some(&target) => {
                    self.cells.add_edge(idx, target, link);
                }
                None => log::debug!(
                    "edge {} {field} {endpoint} not found; left unlinked",
                    self.cells[idx].id
                ),
            }
        }
    }

    fn linked(&self, edge: CellId, link: Link) -> Option<CellId> {
        let idx = *self.index.get(&edge)?;
        self.cells
            .edges_directed(idx, Direction::Outgoing)
            .find(|e| *e.weight() == link)
            .map(|e| self.cells[e.target()].id)
    }

    fn changed(&mut self, idx: NodeIndex, key: &str, value: Value) {
        self.stats.props_set += 1;
        let cell = &self.cells[idx];
        log::trace!("cell {} prop {key} changed", cell.id);
        let event = CellEvent::new("cell:change", Some(cell.id), json!({ "key": key, "value": value }));
        let relink = cell.kind == CellKind::Edge
            && (key.starts_with("source") || key.starts_with("target"));
        if relink {
            self.relink_endpoints(idx);
        }
        self.bus.emit(&event);
    }

    fn live_index(&self, id: CellId, op: &str) -> Option<NodeIndex> {
        if self.disposed {
            log::warn!("{op} on disposed graph ignored");
            return None;
        }
        self.index.get(&id).copied()
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new(GraphOptions::default())
    }
}

impl CanvasEngine for Graph {
    fn add_cell(&mut self, kind: CellKind, spec: DataProps) -> Result<CellId, String> {
        if self.disposed {
            return Err("Graph is disposed".to_string());
        }
        let mut props = cell::normalize(kind, &spec);
        let id = match props.get("id") {
            Some(Value::String(s)) if !s.is_empty() => CellId::intern(s),
            Some(Value::Number(n)) => CellId::intern(&n.to_string()),
            _ => CellId::generate(),
        };
        if self.index.contains_key(&id) {
            return Err(format!("Duplicate cell id \"{id}\""));
        }
        props.insert("id".into(), Value::from(id.as_str()));

        let idx = self.cells.add_node(Cell { id, kind, props });
        self.index.insert(id, idx);
        self.order.push(id);
        if kind == CellKind::Edge {
            self.relink_endpoints(idx);
        }
        self.stats.cells_added += 1;
        log::trace!("cell {id} added ({kind:?})");
        self.bus
            .emit(&CellEvent::new("cell:added", Some(id), Value::Null));
        Ok(id)
    }

    fn remove_cell(&mut self, id: CellId) -> Vec<CellId> {
        let Some(start) = self.live_index(id, "remove_cell") else {
            return Vec::new();
        };

        let mut doomed = Vec::new();
        let mut seen = HashSet::new();
        let mut stack = vec![start];
        while let Some(idx) = stack.pop() {
            if !seen.insert(idx) {
                continue;
            }
            doomed.push(idx);
            for e in self.cells.edges_directed(idx, Direction::Outgoing) {
                if *e.weight() == Link::Child {
                    stack.push(e.target());
                }
            }
            for e in self.cells.edges_directed(idx, Direction::Incoming) {
                if matches!(e.weight(), Link::Source | Link::Target) {
                    stack.push(e.source());
                }
            }
        }

        let mut removed = Vec::with_capacity(doomed.len());
        for idx in doomed {
            if let Some(cell) = self.cells.remove_node(idx) {
                self.index.remove(&cell.id);
                removed.push(cell.id);
            }
        }
        self.order.retain(|id| !removed.contains(id));
        self.stats.cells_removed += removed.len();
        log::trace!("cell {id} removed with {} dependents", removed.len() - 1);

        for id in &removed {
            self.bus
                .emit(&CellEvent::new("cell:removed", Some(*id), Value::Null));
        }
        removed
    }

    fn has_cell(&self, id: CellId) -> bool {
        self.index.contains_key(&id)
    }

    fn cell_kind(&self, id: CellId) -> Option<CellKind> {
        self.cell(id).map(|c| c.kind)
    }

    fn props(&self, id: CellId) -> Option<&DataProps> {
        self.cell(id).map(|c| &c.props)
    }

    fn set_prop(&mut self, id: CellId, key: &str, value: Value) -> bool {
        let Some(idx) = self.live_index(id, "set_prop") else {
            return false;
        };
        let props = &mut self.cells[idx].props;
        if props.get(key) == Some(&value) {
            return false;
        }
        props.insert(key.to_string(), value.clone());
        self.changed(idx, key, value);
        true
    }

    fn remove_prop(&mut self, id: CellId, key: &str) -> bool {
        let Some(idx) = self.live_index(id, "remove_prop") else {
            return false;
        };
        if self.cells[idx].props.remove(key).is_none() {
            return false;
        }
        self.changed(idx, key, Value::Null);
        true
    }

    fn prop_at(&self, id: CellId, path: &str) -> Result<Option<Value>, String> {
        let segments = path::parse_path(path)?;
        Ok(self
            .cell(id)
            .and_then(|c| path::get(&c.props, &segments))
            .cloned())
    }

    fn set_prop_at(&mut self, id: CellId, path: &str, value: Value) -> Result<bool, String> {
        let segments = path::parse_path(path)?;
        let Some(idx) = self.live_index(id, "set_prop_at") else {
            return Ok(false);
        };
        if !path::set(&mut self.cells[idx].props, &segments, value.clone()) {
            return Ok(false);
        }
        self.changed(idx, path, value);
        Ok(true)
    }

    fn remove_prop_at(&mut self, id: CellId, path: &str) -> Result<bool, String> {
        let segments = path::parse_path(path)?;
        let Some(idx) = self.live_index(id, "remove_prop_at") else {
            return Ok(false);
        };
        if !path::remove(&mut self.cells[idx].props, &segments) {
            return Ok(false);
        }
        self.changed(idx, path, Value::Null);
        Ok(true)
    }

    fn normalize(&self, kind: CellKind, spec: &DataProps) -> DataProps {
        cell::normalize(kind, spec)
    }

    fn add_child(&mut self, parent: CellId, child: CellId) -> bool {
        let (Some(p), Some(c)) = (
            self.live_index(parent, "add_child"),
            self.live_index(child, "add_child"),
        ) else {
            return false;
        };
        if parent == child || self.is_ancestor_of(child, parent) {
            log::warn!("nesting {child} under {parent} would create a cycle");
            return false;
        }

        let previous: Vec<_> = self
            .cells
            .edges_directed(c, Direction::Incoming)
            .filter(|e| *e.weight() == Link::Child)
            .map(|e| e.id())
            .collect();
        for edge in previous {
            self.cells.remove_edge(edge);
        }
        self.cells.add_edge(p, c, Link::Child);
        self.cells[c]
            .props
            .insert("parent".into(), Value::from(parent.as_str()));
        self.stats.links += 1;
        log::trace!("cell {child} nested under {parent}");
        true
    }

    fn parent_of(&self, id: CellId) -> Option<CellId> {
        let idx = *self.index.get(&id)?;
        self.cells
            .edges_directed(idx, Direction::Incoming)
            .find(|e| *e.weight() == Link::Child)
            .map(|e| self.cells[e.source()].id)
    }

    fn children_of(&self, id: CellId) -> Vec<CellId> {
        let Some(&idx) = self.index.get(&id) else {
            return Vec::new();
        };
        let children: HashSet<CellId> = self
            .cells
            .edges_directed(idx, Direction::Outgoing)
            .filter(|e| *e.weight() == Link::Child)
            .map(|e| self.cells[e.target()].id)
            .collect();
        self.order
            .iter()
            .filter(|id| children.contains(id))
            .copied()
            .collect()
    }

    fn source_of(&self, edge: CellId) -> Option<CellId> {
        self.linked(edge, Link::Source)
    }

    fn target_of(&self, edge: CellId) -> Option<CellId> {
        self.linked(edge, Link::Target)
    }

    fn on(&mut self, event: &str, handler: Callback) -> SubscriptionId {
        self.bus.on(event, handler)
    }

    fn off(&mut self, subscription: SubscriptionId) -> bool {
        self.bus.off(subscription)
    }

    fn emit(&self, event: &CellEvent) {
        self.bus.emit(event);
    }

    fn use_plugin(&mut self, mut plugin: Box<dyn Plugin>) -> Result<PluginId, String> {
        if self.disposed {
            return Err(format!("Graph is disposed; cannot use plugin {}", plugin.name()));
        }
        let id = PluginId(self.next_plugin);
        self.next_plugin += 1;
        plugin.init();
        log::debug!("plugin {} installed", plugin.name());
        self.plugins.push((id, plugin));
        self.stats.plugins_installed += 1;
        Ok(id)
    }

    fn dispose_plugin(&mut self, id: PluginId) -> bool {
        let Some(pos) = self.plugins.iter().position(|(pid, _)| *pid == id) else {
            return false;
        };
        let (_, mut plugin) = self.plugins.remove(pos);
        plugin.dispose();
        log::debug!("plugin {} disposed", plugin.name());
        self.stats.plugins_disposed += 1;
        true
    }

    fn resize(&mut self, size: Size) {
        if self.disposed {
            log::warn!("resize on disposed graph ignored");
            return;
        }
        if self.size == size {
            return;
        }
        self.size = size;
        self.stats.resizes += 1;
        log::trace!("graph resized to {}x{}", size.width, size.height);
    }

    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        for (_, plugin) in &mut self.plugins {
            plugin.dispose();
            self.stats.plugins_disposed += 1;
        }
        self.plugins.clear();
        self.bus.clear();
        self.cells.clear();
        self.index.clear();
        self.order.clear();
        self.disposed = true;
        log::debug!("graph disposed");
    }

    fn is_disposed(&self) -> bool {
        self.disposed
    }
}
