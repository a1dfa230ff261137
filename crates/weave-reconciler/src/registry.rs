//! Element kind → adapter constructor.
//!
//! Resolved once per instance at creation; the host config never looks at
//! what an instance wraps.

use crate::adapters::{
    CellInstance, HostInstance, MarkerInstance, PluginInstance, PortGroupInstance, label, port, tool,
};
use std::collections::HashMap;
use weave_core::{ElementKind, Props};
use weave_engine::{CanvasEngine, PluginFactory, Selection, Snapline};

/// Builds a live instance for one element kind.
pub type AdapterFactory =
    Box<dyn Fn(&Props, &mut dyn CanvasEngine) -> Result<Box<dyn HostInstance>, String>>;

pub struct AdapterRegistry {
    factories: HashMap<ElementKind, AdapterFactory>,
}

impl AdapterRegistry {
    /// A registry with no adapters at all.
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Adapters for every built-in kind plus the `Snapline` and
    /// `Selection` plugins.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        for kind in [ElementKind::Node, ElementKind::Edge] {
            let tag = kind.clone();
            registry.register(kind, move |props, engine| {
                Ok(Box::new(CellInstance::create(tag.clone(), props, engine)?))
            });
        }
        registry.register(ElementKind::Label, |props, _| Ok(Box::new(label::create(props))));
        registry.register(ElementKind::Port, |props, _| Ok(Box::new(port::create(props))));
        registry.register(ElementKind::NodeTool, |props, _| {
            Ok(Box::new(tool::create_node_tool(props)))
        });
        registry.register(ElementKind::EdgeTool, |props, _| {
            Ok(Box::new(tool::create_edge_tool(props)))
        });
        for kind in [ElementKind::SourceMarker, ElementKind::TargetMarker] {
            let tag = kind.clone();
            registry.register(kind, move |props, _| {
                Ok(Box::new(MarkerInstance::create(tag.clone(), props)))
            });
        }
        registry.register(ElementKind::PortGroup, |props, _| {
            Ok(Box::new(PortGroupInstance::create(props)?))
        });
        registry.register_plugin("Snapline", Snapline::create);
        registry.register_plugin("Selection", Selection::create);
        registry
    }

    /// Register (or replace) the adapter for `kind`.
    pub fn register<F>(&mut self, kind: ElementKind, factory: F)
    where
        F: Fn(&Props, &mut dyn CanvasEngine) -> Result<Box<dyn HostInstance>, String> + 'static,
    {
        if self.factories.insert(kind.clone(), Box::new(factory)).is_some() {
            log::debug!("adapter for {kind} replaced");
        }
    }

    /// Register a plugin element named `name`, built by `factory`.
    pub fn register_plugin(&mut self, name: &str, factory: PluginFactory) {
        let kind = ElementKind::Plugin(name.to_string());
        let tag = kind.clone();
        self.register(kind, move |props, engine| {
            Ok(Box::new(PluginInstance::create(tag.clone(), factory, props, engine)?))
        });
    }

    pub fn contains(&self, kind: &ElementKind) -> bool {
        self.factories.contains_key(kind)
    }

    /// Create an instance for `kind`.
    pub fn create(
        &self,
        kind: &ElementKind,
        props: &Props,
        engine: &mut dyn CanvasEngine,
    ) -> Result<Box<dyn HostInstance>, String> {
        let factory = self
            .factories
            .get(kind)
            .ok_or_else(|| format!("No adapter registered for element kind \"{kind}\""))?;
        factory(props, engine)
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::Owner;
    use serde_json::Value;
    use weave_core::Element;
    use weave_engine::{CellKind, Graph};

    #[test]
    fn defaults_cover_builtin_kinds() {
        let registry = AdapterRegistry::with_defaults();
        for kind in [
            ElementKind::Node,
            ElementKind::Edge,
            ElementKind::Label,
            ElementKind::SourceMarker,
            ElementKind::TargetMarker,
            ElementKind::PortGroup,
            ElementKind::Port,
            ElementKind::NodeTool,
            ElementKind::EdgeTool,
            ElementKind::Plugin("Snapline".into()),
            ElementKind::Plugin("Selection".into()),
        ] {
            assert!(registry.contains(&kind), "{kind} missing");
        }
        assert!(!registry.contains(&ElementKind::Graph));
    }

    #[test]
    fn unknown_kind_is_an_error() {
        let mut graph = Graph::default();
        let registry = AdapterRegistry::with_defaults();
        let el = Element::custom("Minimap");
        let err = registry.create(&el.kind, &el.props, &mut graph).err().unwrap();
        assert_eq!(err, "No adapter registered for element kind \"Minimap\"");
    }

    struct Badge {
        kind: ElementKind,
        removed: bool,
    }

    impl HostInstance for Badge {
        fn kind(&self) -> &ElementKind {
            &self.kind
        }

        fn update(&mut self, _: &Props, _: &Props, _: &mut dyn CanvasEngine) -> Result<(), String> {
            Ok(())
        }

        fn insert_into(&mut self, owner: Option<Owner>, engine: &mut dyn CanvasEngine) -> Result<(), String> {
            if let Some(owner) = owner.filter(|o| o.kind == CellKind::Node) {
                engine.attr(owner.cell, "badge/text", Value::from("!"))?;
            }
            Ok(())
        }

        fn remove_from(&mut self, _: &mut dyn CanvasEngine) {
            self.removed = true;
        }

        fn is_removed(&self) -> bool {
            self.removed
        }
    }

    #[test]
    fn custom_kinds_can_be_registered() {
        let mut graph = Graph::default();
        let mut registry = AdapterRegistry::with_defaults();
        registry.register(ElementKind::Custom("Badge".into()), |_, _| {
            Ok(Box::new(Badge {
                kind: ElementKind::Custom("Badge".into()),
                removed: false,
            }))
        });

        let node = Element::node().id("rg_n");
        let node = registry.create(&node.kind, &node.props, &mut graph).unwrap();
        let badge = Element::custom("Badge");
        let mut badge = registry.create(&badge.kind, &badge.props, &mut graph).unwrap();
        let owner = crate::adapters::owner_of(node.as_ref(), &graph);
        badge.insert_into(owner, &mut graph).unwrap();

        assert_eq!(
            graph.prop_at(node.cell().unwrap(), "attrs/badge/text").unwrap(),
            Some(Value::from("!"))
        );
    }
}
