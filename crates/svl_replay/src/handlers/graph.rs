//! Graph handlers.
//!
//! Node operations also accept tree structures, since tree nodes carry
//! the same fields. `addNode` and `removeNode` edit the node list only and
//! never touch `parent`, `children` or `root`.

use super::{Cue, OpOutcome};
use crate::store::StateStore;
use svl_core::op::{
    AddEdge, AddNode, RemoveEdge, RemoveNode, UpdateEdgeStyle, UpdateNodeProperties, UpdateNodeStyle,
};
use svl_core::{Structure, GraphStructure};

macro_rules! nodes {
    ($store:expr) => {{
        let found = $store.data_state().kind();
        match $store.data_state_mut().structure.nodes_mut() {
            Some(nodes) => nodes,
            None => return OpOutcome::wrong_structure("graph", found),
        }
    }};
}

fn graph(store: &mut StateStore) -> Result<&mut GraphStructure, OpOutcome> {
    let found = store.data_state().kind();
    match &mut store.data_state_mut().structure {
        Structure::Graph(g) => Ok(g),
        _ => Err(OpOutcome::wrong_structure("graph", found)),
    }
}

pub(super) fn update_node_style(store: &mut StateStore, p: &UpdateNodeStyle) -> OpOutcome {
    let nodes = nodes!(store);
    for id in &p.ids {
        match nodes.iter_mut().find(|n| &n.id == id) {
            Some(node) => node.style_key = Some(p.style_key.clone()),
            None => tracing::debug!(%id, "updateNodeStyle: node not found"),
        }
    }
    OpOutcome::DONE
}

pub(super) fn update_node_properties(store: &mut StateStore, p: &UpdateNodeProperties) -> OpOutcome {
    let nodes = nodes!(store);
    for update in &p.updates {
        let Some(node) = nodes.iter_mut().find(|n| n.id == update.id) else {
            tracing::debug!(id = %update.id, "updateNodeProperties: node not found");
            continue;
        };
        let properties = node.properties.get_or_insert_with(Default::default);
        for (key, value) in &update.properties {
            properties.insert(key.clone(), value.clone());
        }
    }
    OpOutcome::DONE
}

pub(super) fn update_edge_style(store: &mut StateStore, p: &UpdateEdgeStyle) -> OpOutcome {
    let g = match graph(store) {
        Ok(g) => g,
        Err(outcome) => return outcome,
    };
    for edge_ref in &p.edges {
        match g.edges.iter_mut().find(|e| e.connects(&edge_ref.from, &edge_ref.to)) {
            Some(edge) => edge.style_key = Some(p.style_key.clone()),
            None => tracing::debug!(from = %edge_ref.from, to = %edge_ref.to, "updateEdgeStyle: edge not found"),
        }
    }
    OpOutcome::DONE
}

pub(super) fn add_node(store: &mut StateStore, p: &AddNode) -> OpOutcome {
    let nodes = nodes!(store);
    nodes.push(p.node.clone());
    OpOutcome::cue(Cue::Add)
}

pub(super) fn remove_node(store: &mut StateStore, p: &RemoveNode) -> OpOutcome {
    let nodes = nodes!(store);
    let before = nodes.len();
    nodes.retain(|n| n.id != p.id);
    if nodes.len() == before {
        return OpOutcome::not_found("node", &p.id);
    }
    OpOutcome::cue(Cue::Remove)
}

pub(super) fn add_edge(store: &mut StateStore, p: &AddEdge) -> OpOutcome {
    match graph(store) {
        Ok(g) => {
            g.edges.push(p.edge.clone());
            OpOutcome::cue(Cue::Add)
        }
        Err(outcome) => outcome,
    }
}

pub(super) fn remove_edge(store: &mut StateStore, p: &RemoveEdge) -> OpOutcome {
    let g = match graph(store) {
        Ok(g) => g,
        Err(outcome) => return outcome,
    };
    let before = g.edges.len();
    g.edges.retain(|e| !e.connects(&p.from, &p.to));
    if g.edges.len() == before {
        return OpOutcome::not_found("edge", format!("{}->{}", p.from, p.to));
    }
    OpOutcome::cue(Cue::Remove)
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::{run, store};
    use super::*;
    use serde_json::{json, Value};
    use svl_core::EntityId;

    fn sample() -> Value {
        json!({
            "type": "graph",
            "structure": {
                "nodes": [
                    {"id": "a", "label": "A"},
                    {"id": "b", "label": "B", "properties": {"dist": 4}},
                    {"id": 3, "label": "C"}
                ],
                "edges": [
                    {"from": "a", "to": "b", "weight": 4},
                    {"from": "b", "to": 3}
                ]
            }
        })
    }

    fn graph_of(s: &StateStore) -> &GraphStructure {
        match &s.data_state().structure {
            Structure::Graph(g) => g,
            _ => panic!("expected graph"),
        }
    }

    #[test]
    fn test_node_style_skips_missing() {
        let mut s = store(sample());
        run(&mut s, "updateNodeStyle", json!({"ids": ["a", "zz", 3], "styleKey": "visited"}));
        let g = graph_of(&s);
        assert_eq!(g.nodes[0].style_key.as_deref(), Some("visited"));
        assert_eq!(g.nodes[1].style_key, None);
        assert_eq!(g.nodes[2].style_key.as_deref(), Some("visited"));
    }

    #[test]
    fn test_properties_shallow_merge() {
        let mut s = store(sample());
        run(
            &mut s,
            "updateNodeProperties",
            json!({"updates": [
                {"id": "b", "properties": {"dist": 2, "prev": "a"}},
                {"id": "a", "properties": {"dist": 0}}
            ]}),
        );
        let g = graph_of(&s);
        let b = g.nodes[1].properties.as_ref().unwrap();
        assert_eq!(b.get("dist"), Some(&json!(2)));
        assert_eq!(b.get("prev"), Some(&json!("a")));
        assert_eq!(g.nodes[0].properties.as_ref().unwrap().get("dist"), Some(&json!(0)));
    }

    #[test]
    fn test_edge_style_matches_direction() {
        let mut s = store(sample());
        run(
            &mut s,
            "updateEdgeStyle",
            json!({"edges": [{"from": "b", "to": "a"}, {"from": "b", "to": 3}], "styleKey": "tree"}),
        );
        let g = graph_of(&s);
        assert_eq!(g.edges[0].style_key, None);
        assert_eq!(g.edges[1].style_key.as_deref(), Some("tree"));
    }

    #[test]
    fn test_add_and_remove() {
        let mut s = store(sample());
        assert_eq!(run(&mut s, "addNode", json!({"node": {"id": "d"}})), OpOutcome::Applied(Some(Cue::Add)));
        assert_eq!(
            run(&mut s, "addEdge", json!({"edge": {"from": "d", "to": "a"}})),
            OpOutcome::Applied(Some(Cue::Add))
        );
        assert_eq!(
            run(&mut s, "removeEdge", json!({"from": "a", "to": "b"})),
            OpOutcome::Applied(Some(Cue::Remove))
        );
        assert!(!run(&mut s, "removeEdge", json!({"from": "a", "to": "b"})).is_applied());
        assert!(run(&mut s, "removeNode", json!({"id": 3})).is_applied());

        let g = graph_of(&s);
        let ids: Vec<&EntityId> = g.nodes.iter().map(|n| &n.id).collect();
        assert_eq!(ids, vec![&EntityId::from("a"), &EntityId::from("b"), &EntityId::from("d")]);
        assert_eq!(g.edges.len(), 2);
    }

    #[test]
    fn test_node_ops_apply_to_trees() {
        let mut s = store(json!({
            "type": "tree",
            "structure": {"root": "r", "nodes": [{"id": "r"}]}
        }));
        assert!(run(&mut s, "updateNodeStyle", json!({"ids": ["r"], "styleKey": "active"})).is_applied());
        assert_eq!(
            s.data_state().structure.find_node(&EntityId::from("r")).unwrap().style_key.as_deref(),
            Some("active")
        );
        assert!(!run(&mut s, "addEdge", json!({"edge": {"from": "r", "to": "r"}})).is_applied());
    }

    #[test]
    fn test_node_list_ops_leave_tree_links() {
        let mut s = store(json!({
            "type": "tree",
            "structure": {"root": "r", "nodes": [{"id": "r", "children": ["a"]}, {"id": "a", "parent": "r"}]}
        }));
        assert!(run(&mut s, "removeNode", json!({"id": "a"})).is_applied());
        assert!(run(&mut s, "addNode", json!({"node": {"id": "x"}})).is_applied());

        let Structure::Tree(t) = &s.data_state().structure else {
            panic!("expected tree");
        };
        assert_eq!(t.nodes.len(), 2);
        assert_eq!(t.nodes[0].children, vec![EntityId::from("a")]);
        assert_eq!(t.nodes[1].id, EntityId::from("x"));
        assert_eq!(t.nodes[1].parent, None);
        assert_eq!(t.root, Some(EntityId::from("r")));
    }
}
