//! Host config: the verbs a tree reconciler calls to materialize elements.
//!
//! [`HostConfig`] is the generic contract; [`CanvasHost`] implements it over
//! a canvas engine by dispatching every verb to the instance's adapter.

use crate::adapters::{HostInstance, owner_of};
use crate::registry::AdapterRegistry;
use weave_core::{ElementKind, Props};
use weave_engine::CanvasEngine;

pub trait HostConfig {
    type Instance;

    fn create_instance(&mut self, kind: &ElementKind, props: &Props) -> Result<Self::Instance, String>;

    /// Attach a child while its parent is still being built.
    fn append_initial_child(
        &mut self,
        parent: &mut Self::Instance,
        child: &mut Self::Instance,
    ) -> Result<(), String>;

    fn append_child(&mut self, parent: &mut Self::Instance, child: &mut Self::Instance) -> Result<(), String>;

    fn insert_before(
        &mut self,
        parent: &mut Self::Instance,
        child: &mut Self::Instance,
        before: &Self::Instance,
    ) -> Result<(), String>;

    fn append_child_to_container(&mut self, child: &mut Self::Instance) -> Result<(), String> {
        let _ = child;
        Ok(())
    }

    fn insert_in_container_before(
        &mut self,
        child: &mut Self::Instance,
        before: &Self::Instance,
    ) -> Result<(), String> {
        let _ = (child, before);
        Ok(())
    }

    fn remove_child(&mut self, parent: &mut Self::Instance, child: &mut Self::Instance);

    fn remove_child_from_container(&mut self, child: &mut Self::Instance);

    fn commit_update(&mut self, instance: &mut Self::Instance, old: &Props, new: &Props) -> Result<(), String>;

    /// Release what removal left behind. Called for every instance of a
    /// deleted subtree.
    fn detach_deleted_instance(&mut self, instance: &mut Self::Instance);

    // ─── Lifecycle hooks ─────────────────────────────────────────────────

    fn root_host_context(&self) {}

    fn child_host_context(&self, kind: &ElementKind) {
        let _ = kind;
    }

    fn should_set_text_content(&self, kind: &ElementKind) -> bool {
        let _ = kind;
        false
    }

    /// Return true to be called back after the initial mount.
    fn finalize_initial_children(&mut self, instance: &mut Self::Instance) -> bool {
        let _ = instance;
        false
    }

    fn prepare_for_commit(&mut self) {}

    fn reset_after_commit(&mut self) {}

    fn clear_container(&mut self) {}
}

/// Host config over a canvas engine. Owns the engine for the lifetime of
/// the root.
pub struct CanvasHost<E: CanvasEngine> {
    engine: E,
    registry: AdapterRegistry,
}

impl<E: CanvasEngine> CanvasHost<E> {
    pub fn new(engine: E, registry: AdapterRegistry) -> Self {
        Self { engine, registry }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn registry(&self) -> &AdapterRegistry {
        &self.registry
    }

    fn insert(&mut self, parent: &dyn HostInstance, child: &mut dyn HostInstance) -> Result<(), String> {
        let owner = owner_of(parent, &self.engine);
        log::trace!("insert {} into {}", child.kind(), parent.kind());
        child.insert_into(owner, &mut self.engine)
    }
}

impl<E: CanvasEngine> HostConfig for CanvasHost<E> {
    type Instance = Box<dyn HostInstance>;

    fn create_instance(&mut self, kind: &ElementKind, props: &Props) -> Result<Self::Instance, String> {
        log::trace!("create {kind}");
        self.registry.create(kind, props, &mut self.engine)
    }

    fn append_initial_child(
        &mut self,
        parent: &mut Self::Instance,
        child: &mut Self::Instance,
    ) -> Result<(), String> {
        self.insert(&**parent, &mut **child)
    }

    fn append_child(&mut self, parent: &mut Self::Instance, child: &mut Self::Instance) -> Result<(), String> {
        self.insert(&**parent, &mut **child)
    }

    /// Entries are keyed by id, so position among siblings does not matter.
    fn insert_before(
        &mut self,
        parent: &mut Self::Instance,
        child: &mut Self::Instance,
        _before: &Self::Instance,
    ) -> Result<(), String> {
        self.insert(&**parent, &mut **child)
    }

    fn remove_child(&mut self, parent: &mut Self::Instance, child: &mut Self::Instance) {
        log::trace!("remove {} from {}", child.kind(), parent.kind());
        child.remove_from(&mut self.engine);
    }

    fn remove_child_from_container(&mut self, child: &mut Self::Instance) {
        log::trace!("remove {} from canvas", child.kind());
        child.remove_from(&mut self.engine);
    }

    fn commit_update(&mut self, instance: &mut Self::Instance, old: &Props, new: &Props) -> Result<(), String> {
        log::trace!("update {}", instance.kind());
        instance.update(old, new, &mut self.engine)
    }

    fn detach_deleted_instance(&mut self, instance: &mut Self::Instance) {
        instance.detach(&mut self.engine);
    }
}
