//! Tree handlers.
//!
//! `addChild` and `reparent` keep each node's `parent` and its parent's
//! `children` in agreement. `removeChild` and `swapNodes` touch only the
//! lists they name. A `reparent` without a new parent makes the node the
//! root; the root it replaces keeps no parent and is listed nowhere.

use super::{Cue, OpOutcome, SkipReason};
use crate::overlay::{Overlay, OverlayCategory, OverlayShape};
use crate::store::StateStore;
use indexmap::IndexMap;
use std::collections::VecDeque;
use svl_core::op::{AddChild, HighlightPath, RemoveChild, Reparent, SwapNodes};
use svl_core::{EntityId, Node, Structure, TreeStructure};

const PATH_NODE_STYLE: &str = "active";
const DEFAULT_PATH_STYLE: &str = "path";

fn tree(store: &mut StateStore) -> Result<&mut TreeStructure, OpOutcome> {
    let found = store.data_state().kind();
    match &mut store.data_state_mut().structure {
        Structure::Tree(t) => Ok(t),
        _ => Err(OpOutcome::wrong_structure("tree", found)),
    }
}

fn position(nodes: &[Node], id: &EntityId) -> Option<usize> {
    nodes.iter().position(|n| &n.id == id)
}

/// Breadth-first search from `from` to `to` over child links only
fn path(nodes: &[Node], from: &EntityId, to: &EntityId) -> Option<Vec<EntityId>> {
    let mut came_from: IndexMap<&EntityId, Option<&EntityId>> = IndexMap::new();
    let mut queue = VecDeque::from([from]);
    came_from.insert(from, None);

    while let Some(current) = queue.pop_front() {
        if current == to {
            let mut path = vec![current.clone()];
            let mut cursor = current;
            while let Some(Some(prev)) = came_from.get(cursor) {
                path.push((*prev).clone());
                cursor = *prev;
            }
            path.reverse();
            return Some(path);
        }
        let Some(node) = nodes.iter().find(|n| &n.id == current) else {
            continue;
        };
        for child in &node.children {
            if !came_from.contains_key(child) {
                came_from.insert(child, Some(current));
                queue.push_back(child);
            }
        }
    }
    None
}

pub(super) fn add_child(store: &mut StateStore, p: &AddChild) -> OpOutcome {
    let t = match tree(store) {
        Ok(t) => t,
        Err(outcome) => return outcome,
    };
    let mut node = p.node.clone();
    let child_id = node.id.clone();

    match &p.parent_id {
        Some(parent_id) => {
            node.parent = Some(parent_id.clone());
            match t.nodes.iter_mut().find(|n| &n.id == parent_id) {
                Some(parent) if !parent.children.contains(&child_id) => parent.children.push(child_id),
                Some(_) => {}
                None => tracing::debug!(%parent_id, "addChild: parent not found"),
            }
        }
        None if t.root.is_none() => t.root = Some(child_id),
        None => {}
    }
    t.nodes.push(node);
    OpOutcome::cue(Cue::Add)
}

pub(super) fn remove_child(store: &mut StateStore, p: &RemoveChild) -> OpOutcome {
    let t = match tree(store) {
        Ok(t) => t,
        Err(outcome) => return outcome,
    };
    let Some(parent) = t.nodes.iter_mut().find(|n| n.id == p.parent_id) else {
        return OpOutcome::not_found("node", &p.parent_id);
    };
    let before = parent.children.len();
    parent.children.retain(|c| c != &p.child_id);
    if parent.children.len() == before {
        return OpOutcome::not_found("child", &p.child_id);
    }
    OpOutcome::cue(Cue::Remove)
}

pub(super) fn reparent(store: &mut StateStore, p: &Reparent) -> OpOutcome {
    let t = match tree(store) {
        Ok(t) => t,
        Err(outcome) => return outcome,
    };
    let Some(node_pos) = position(&t.nodes, &p.node_id) else {
        return OpOutcome::not_found("node", &p.node_id);
    };
    let new_parent_pos = match &p.new_parent_id {
        Some(parent_id) => {
            let Some(pos) = position(&t.nodes, parent_id) else {
                return OpOutcome::not_found("node", parent_id);
            };
            Some(pos)
        }
        None => None,
    };

    // Detach from the current parent
    if let Some(old_parent) = t.nodes[node_pos].parent.take() {
        if let Some(pos) = position(&t.nodes, &old_parent) {
            t.nodes[pos].children.retain(|c| c != &p.node_id);
        }
    }

    match (new_parent_pos, &p.new_parent_id) {
        (Some(pos), Some(parent_id)) => {
            t.nodes[node_pos].parent = Some(parent_id.clone());
            let children = &mut t.nodes[pos].children;
            let at = p
                .index
                .map_or(children.len(), |i| i.clamp(0, children.len() as i64) as usize);
            children.insert(at, p.node_id.clone());
            if t.root.as_ref() == Some(&p.node_id) {
                t.root = None;
            }
        }
        _ => t.root = Some(p.node_id.clone()),
    }
    OpOutcome::DONE
}

pub(super) fn swap_nodes(store: &mut StateStore, p: &SwapNodes) -> OpOutcome {
    let t = match tree(store) {
        Ok(t) => t,
        Err(outcome) => return outcome,
    };
    let Some(i) = position(&t.nodes, &p.a_id) else {
        return OpOutcome::not_found("node", &p.a_id);
    };
    let Some(j) = position(&t.nodes, &p.b_id) else {
        return OpOutcome::not_found("node", &p.b_id);
    };
    if i == j {
        return OpOutcome::DONE;
    }

    let (lo, hi) = (i.min(j), i.max(j));
    let (left, right) = t.nodes.split_at_mut(hi);
    let (a, b) = (&mut left[lo], &mut right[0]);

    if a.label.is_some() && b.label.is_some() {
        std::mem::swap(&mut a.label, &mut b.label);
    }
    if a.properties.is_some() && b.properties.is_some() {
        std::mem::swap(&mut a.properties, &mut b.properties);
    }
    if p.swap_children {
        // Children keep their parent pointers
        std::mem::swap(&mut a.children, &mut b.children);
    }
    OpOutcome::cue(Cue::Swap)
}

pub(super) fn highlight_path(store: &mut StateStore, p: &HighlightPath) -> OpOutcome {
    let t = match tree(store) {
        Ok(t) => t,
        Err(outcome) => return outcome,
    };
    let Some(path) = path(&t.nodes, &p.from_id, &p.to_id) else {
        return OpOutcome::Skipped(SkipReason::NoPath {
            from: p.from_id.to_string(),
            to: p.to_id.to_string(),
        });
    };

    for node in t.nodes.iter_mut().filter(|n| path.contains(&n.id)) {
        node.style_key = Some(PATH_NODE_STYLE.to_string());
    }

    let style_key = p.style_key.as_deref().unwrap_or(DEFAULT_PATH_STYLE);
    let overlays = store.overlays_mut();
    for pair in path.windows(2) {
        overlays.push(Overlay::new(
            OverlayCategory::PathEdge,
            OverlayShape::PathEdge {
                from: pair[0].clone(),
                to: pair[1].clone(),
                style_key: style_key.to_string(),
            },
        ));
    }
    OpOutcome::cue(Cue::Highlight)
}
