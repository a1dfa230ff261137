pub mod adapters;
pub mod canvas;
pub mod events;
pub mod host;
pub mod reconciler;
pub mod registry;

pub use adapters::{HostInstance, Owner};
pub use canvas::{CanvasRoot, RootState};
pub use events::{Binding, EventScope, bind};
pub use host::{CanvasHost, HostConfig};
pub use reconciler::{FiberKey, Reconciler};
pub use registry::{AdapterFactory, AdapterRegistry};

// Re-export the lower layers so hosts only depend on this crate
pub use weave_core::{self as core, CellEvent, CellId, Element, ElementKind};
pub use weave_engine::{self as engine, CanvasEngine, Graph, GraphOptions, Size};
