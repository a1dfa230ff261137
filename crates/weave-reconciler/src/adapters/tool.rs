//! Cell tools (`button-remove`, `vertices`, ...), stored under `tools`.
//!
//! Node tools only attach to nodes and edge tools only to edges.

use super::list::{EntryInstance, EntrySpec, plain_entry};
use weave_core::{ElementKind, Props};
use weave_engine::{CellKind, ListSlot};

pub const NODE_TOOL: EntrySpec = EntrySpec {
    slot: ListSlot::Tools,
    owner: CellKind::Node,
    build: plain_entry,
};

pub const EDGE_TOOL: EntrySpec = EntrySpec {
    slot: ListSlot::Tools,
    owner: CellKind::Edge,
    build: plain_entry,
};

pub fn create_node_tool(props: &Props) -> EntryInstance {
    EntryInstance::create(ElementKind::NodeTool, NODE_TOOL, props)
}

pub fn create_edge_tool(props: &Props) -> EntryInstance {
    EntryInstance::create(ElementKind::EdgeTool, EDGE_TOOL, props)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{HostInstance, Owner};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use weave_core::{DataProps, Element};
    use weave_engine::{CanvasEngine, Graph};

    fn owner(graph: &mut Graph, kind: CellKind, id: &str) -> Owner {
        let mut spec = DataProps::new();
        spec.insert("id".into(), json!(id));
        let cell = graph.add_cell(kind, spec).unwrap();
        Owner { cell, kind }
    }

    #[test]
    fn tools_match_their_owner_kind() {
        let mut graph = Graph::default();
        let node = owner(&mut graph, CellKind::Node, "tl_n");
        let edge = owner(&mut graph, CellKind::Edge, "tl_e");

        let el = Element::node_tool().id("tl_rm").prop("name", "button-remove");
        let mut on_node = create_node_tool(&el.props);
        on_node.insert_into(Some(node), &mut graph).unwrap();

        let el = Element::edge_tool().id("tl_v").prop("name", "vertices");
        let mut misplaced = create_edge_tool(&el.props);
        misplaced.insert_into(Some(node), &mut graph).unwrap();
        let mut on_edge = create_edge_tool(&el.props);
        on_edge.insert_into(Some(edge), &mut graph).unwrap();

        assert_eq!(
            graph.entries(node.cell, ListSlot::Tools).unwrap(),
            vec![json!({"id": "tl_rm", "name": "button-remove"})]
        );
        assert_eq!(
            graph.entries(edge.cell, ListSlot::Tools).unwrap(),
            vec![json!({"id": "tl_v", "name": "vertices"})]
        );
    }
}
