//! Node ports, stored under `ports/items`.

use super::list::{EntryInstance, EntrySpec, plain_entry};
use weave_core::{ElementKind, Props};
use weave_engine::{CellKind, ListSlot};

pub const PORT: EntrySpec = EntrySpec {
    slot: ListSlot::Ports,
    owner: CellKind::Node,
    build: plain_entry,
};

pub fn create(props: &Props) -> EntryInstance {
    EntryInstance::create(ElementKind::Port, PORT, props)
}
