//! Plugin attachment: installs a graph-wide plugin for as long as its
//! element is mounted.
//!
//! Options are read once. Updating a mounted plugin's options does nothing;
//! only its handlers are rebound.

use super::HostInstance;
use crate::events::{Binding, EventScope, bind};
use weave_core::{ElementKind, Props, SplitProps, split};
use weave_engine::{CanvasEngine, PluginFactory, PluginId};

pub struct PluginInstance {
    kind: ElementKind,
    scope: EventScope,
    id: PluginId,
    binding: Binding,
    removed: bool,
}

impl PluginInstance {
    pub fn create(
        kind: ElementKind,
        factory: PluginFactory,
        props: &Props,
        engine: &mut dyn CanvasEngine,
    ) -> Result<Self, String> {
        let SplitProps { data, events } = split(props);
        let plugin = factory(&data)?;
        let scope = EventScope::Plugin(plugin.name().to_string());
        let id = engine.use_plugin(plugin)?;
        let binding = bind(&scope, &events, engine);
        log::trace!("plugin {kind} installed");
        Ok(Self {
            kind,
            scope,
            id,
            binding,
            removed: false,
        })
    }

    pub fn plugin_id(&self) -> PluginId {
        self.id
    }
}

impl HostInstance for PluginInstance {
    fn kind(&self) -> &ElementKind {
        &self.kind
    }

    fn update(&mut self, old: &Props, new: &Props, engine: &mut dyn CanvasEngine) -> Result<(), String> {
        let after = split(new);
        if split(old).data != after.data {
            log::debug!("plugin {}: option changes after mount are ignored", self.kind);
        }
        if !self.removed {
            self.binding.rebind(&self.scope, &after.events, engine);
        }
        Ok(())
    }

    fn remove_from(&mut self, engine: &mut dyn CanvasEngine) {
        if self.removed {
            return;
        }
        self.removed = true;
        self.binding.dispose(engine);
        if engine.dispose_plugin(self.id) {
            log::trace!("plugin {} disposed", self.kind);
        } else {
            log::debug!("plugin {} was already disposed", self.kind);
        }
    }

    fn detach(&mut self, engine: &mut dyn CanvasEngine) {
        self.binding.dispose(engine);
    }

    fn is_removed(&self) -> bool {
        self.removed
    }
}
