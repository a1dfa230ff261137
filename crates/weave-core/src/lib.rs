pub mod id;
pub mod identity;
pub mod model;
pub mod props;

pub use id::CellId;
pub use identity::{IdentityTable, content_hash};
pub use model::*;
pub use props::{DataProps, EventHandlers, SplitProps, data_props, event_name, split};
