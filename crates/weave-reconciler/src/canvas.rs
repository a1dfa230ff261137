//! Canvas root: owns the engine and one reconciliation root.
//!
//! Lifecycle is `Uninitialized → Mounted → Disposed`. Every render resolves
//! identity keys with the root's own [`IdentityTable`], then hands the
//! resolved children to the reconciler. Unmounting removes every live
//! instance before the engine is disposed.

use crate::adapters::HostInstance;
use crate::events::{Binding, EventScope};
use crate::host::CanvasHost;
use crate::reconciler::Reconciler;
use crate::registry::AdapterRegistry;
use kurbo::Size;
use weave_core::{CellId, Element, ElementKind, IdentityTable, SplitProps, split};
use weave_engine::{CanvasEngine, Graph, GraphOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootState {
    Uninitialized,
    Mounted,
    Disposed,
}

pub struct CanvasRoot<E: CanvasEngine = Graph> {
    state: RootState,
    registry: Option<AdapterRegistry>,
    reconciler: Option<Reconciler<CanvasHost<E>>>,
    identities: IdentityTable,
    /// Last resolved children, to skip renders that change nothing.
    rendered: Vec<Element>,
    size: Size,
    surface: Binding,
}

impl<E: CanvasEngine> CanvasRoot<E> {
    /// A root whose elements are built by `registry`.
    pub fn with_registry(registry: AdapterRegistry) -> Self {
        Self {
            state: RootState::Uninitialized,
            registry: Some(registry),
            reconciler: None,
            identities: IdentityTable::new(),
            rendered: Vec::new(),
            size: Size::ZERO,
            surface: Binding::default(),
        }
    }

    pub fn state(&self) -> RootState {
        self.state
    }

    /// Take ownership of `engine` and open the reconciliation root.
    pub fn mount_with(&mut self, engine: E, size: Size) -> Result<(), String> {
        if self.state != RootState::Uninitialized {
            return Err(format!("Canvas root cannot mount while {:?}", self.state));
        }
        let registry = self.registry.take().unwrap_or_default();
        self.reconciler = Some(Reconciler::new(CanvasHost::new(engine, registry)));
        self.size = size;
        self.state = RootState::Mounted;
        log::debug!("canvas root mounted at {}x{}", size.width, size.height);
        Ok(())
    }

    /// Bring the canvas in line with `children`.
    pub fn render(&mut self, children: Vec<Element>) -> Result<(), String> {
        let reconciler = match (self.state, self.reconciler.as_mut()) {
            (RootState::Mounted, Some(reconciler)) => reconciler,
            (state, _) => return Err(format!("Canvas root cannot render while {state:?}")),
        };
        let resolved = self.identities.resolve_root(children)?;
        if resolved == self.rendered {
            log::debug!("children unchanged; render skipped");
            return Ok(());
        }
        self.rendered = resolved.clone();
        reconciler.update_container(resolved)
    }

    /// Resize the surface. Does nothing when the size is unchanged.
    pub fn set_size(&mut self, size: Size) {
        if self.state != RootState::Mounted || size == self.size {
            return;
        }
        self.size = size;
        if let Some(engine) = self.graph_mut() {
            engine.resize(size);
        }
    }

    pub fn size(&self) -> Size {
        self.size
    }

    /// Remove every live instance, then dispose the engine.
    pub fn unmount(&mut self) {
        if self.state != RootState::Mounted {
            return;
        }
        if let Some(reconciler) = self.reconciler.as_mut() {
            if let Err(e) = reconciler.update_container(Vec::new()) {
                log::warn!("unmount: {e}");
            }
            let engine = reconciler.host_mut().engine_mut();
            self.surface.dispose(&mut *engine);
            engine.dispose();
        }
        self.identities.clear();
        self.rendered.clear();
        self.state = RootState::Disposed;
        log::debug!("canvas root disposed");
    }

    /// The engine, once mounted. Still available after disposal.
    pub fn graph(&self) -> Option<&E> {
        self.reconciler.as_ref().map(|r| r.host().engine())
    }

    pub fn graph_mut(&mut self) -> Option<&mut E> {
        self.reconciler.as_mut().map(|r| r.host_mut().engine_mut())
    }

    pub fn reconciler(&self) -> Option<&Reconciler<CanvasHost<E>>> {
        self.reconciler.as_ref()
    }

    /// The live instance of the top-level element keyed `key`.
    pub fn instance(&self, key: &str) -> Option<&dyn HostInstance> {
        self.reconciler
            .as_ref()?
            .instance(CellId::intern(key))
            .map(|instance| &**instance)
    }

    pub fn identities(&self) -> &IdentityTable {
        &self.identities
    }
}

impl CanvasRoot<Graph> {
    /// A root over the in-memory [`Graph`] with the built-in adapters.
    pub fn new() -> Self {
        Self::with_registry(AdapterRegistry::with_defaults())
    }

    /// Build a [`Graph`] from `options` and mount it.
    pub fn mount(&mut self, options: GraphOptions) -> Result<(), String> {
        let size = options.size();
        self.mount_with(Graph::new(options), size)
    }

    /// Render a whole `Graph` surface element: mount on first use, resize
    /// when its dimensions change, bind its handlers to every cell event,
    /// then render its children.
    pub fn render_element(&mut self, element: Element) -> Result<(), String> {
        if element.kind != ElementKind::Graph {
            return Err(format!("Expected a Graph element, got {}", element.kind));
        }
        let SplitProps { data, events } = split(&element.props);
        let options = GraphOptions::from_props(&data)?;
        match self.state {
            RootState::Uninitialized => self.mount(options)?,
            RootState::Mounted => self.set_size(options.size()),
            RootState::Disposed => return Err("Canvas root is disposed".to_string()),
        }
        if let Some(reconciler) = self.reconciler.as_mut() {
            let engine = reconciler.host_mut().engine_mut();
            self.surface.rebind(&EventScope::Graph, &events, engine);
        }
        self.render(element.children)
    }
}

impl Default for CanvasRoot<Graph> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: CanvasEngine> Drop for CanvasRoot<E> {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn mounted() -> CanvasRoot {
        let mut root = CanvasRoot::new();
        root.mount(GraphOptions::default()).unwrap();
        root
    }

    fn engine(root: &CanvasRoot) -> &Graph {
        root.graph().unwrap()
    }

    #[test]
    fn lifecycle_states() {
        let mut root: CanvasRoot = CanvasRoot::new();
        assert_eq!(root.state(), RootState::Uninitialized);
        assert!(root.render(vec![]).is_err());

        root.mount(GraphOptions::default()).unwrap();
        assert_eq!(root.state(), RootState::Mounted);
        assert!(root.mount(GraphOptions::default()).is_err());

        root.unmount();
        assert_eq!(root.state(), RootState::Disposed);
        assert!(engine(&root).is_disposed());
        assert!(root.render(vec![Element::node()]).is_err());
    }

    #[test]
    fn identical_render_is_skipped() {
        let mut root = mounted();
        let children = || vec![Element::node().id("cv_a").prop("x", 1)];
        root.render(children()).unwrap();
        let before = engine(&root).stats();
        root.render(children()).unwrap();
        assert_eq!(engine(&root).stats(), before);
    }

    #[test]
    fn resize_without_remount() {
        let mut root = mounted();
        root.render(vec![Element::node().id("cv_keep")]).unwrap();
        root.set_size(Size::new(800.0, 600.0));
        assert_eq!(engine(&root).stats().resizes, 0);
        root.set_size(Size::new(1200.0, 900.0));
        assert_eq!(engine(&root).stats().resizes, 1);
        assert_eq!(engine(&root).size(), Size::new(1200.0, 900.0));
        assert!(engine(&root).has_cell(CellId::intern("cv_keep")));
    }

    #[test]
    fn unmount_removes_instances_before_disposal() {
        let mut root = mounted();
        root.render(vec![
            Element::node().id("cv_1").on("click", |_| {}),
            Element::node().id("cv_2"),
            Element::plugin("Selection"),
        ])
        .unwrap();
        root.unmount();
        root.unmount();

        let stats = engine(&root).stats();
        assert_eq!(stats.cells_removed, 2);
        assert_eq!(stats.plugins_disposed, 1);
        assert!(root.identities().is_empty());
    }

    #[test]
    fn render_element_mounts_and_binds_surface_handlers() {
        let hits = std::rc::Rc::new(std::cell::Cell::new(0));
        let seen = hits.clone();
        let surface = |width: u32| {
            let seen = seen.clone();
            Element::graph()
                .prop("width", width)
                .prop("height", 400)
                .prop("grid", true)
                .on("click", move |_| seen.set(seen.get() + 1))
                .child(Element::node().id("cv_g1"))
        };

        let mut root = CanvasRoot::new();
        root.render_element(surface(600)).unwrap();
        assert_eq!(root.state(), RootState::Mounted);
        assert_eq!(engine(&root).options().grid, Some(json!(true)));
        assert_eq!(root.size(), Size::new(600.0, 400.0));

        root.render_element(surface(900)).unwrap();
        assert_eq!(engine(&root).size(), Size::new(900.0, 400.0));
        assert_eq!(engine(&root).listener_count("cell:click"), 1);

        engine(&root).trigger("cell:click", Some(CellId::intern("cv_g1")), json!(null));
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn render_element_rejects_other_kinds() {
        let mut root = CanvasRoot::new();
        assert!(root.render_element(Element::node()).is_err());
    }

    #[test]
    fn top_level_instance_access() {
        let mut root = mounted();
        root.render(vec![Element::node().id("cv_ref")]).unwrap();
        let instance = root.instance("cv_ref").unwrap();
        assert_eq!(instance.cell(), Some(CellId::intern("cv_ref")));
        assert!(root.instance("cv_none").is_none());
    }
}
