//! Operation handlers.
//!
//! [`apply`] dispatches a typed [`Operation`] to the handler for its shape.
//! Handlers mutate the store in place and never fail: parameters that
//! address missing entities are dropped and reported through
//! [`OpOutcome::Skipped`].

mod array;
mod comment;
mod graph;
mod hashtable;
mod list;
mod table;
mod tree;

use crate::store::StateStore;
use serde::{Deserialize, Serialize};
use svl_core::{DataKind, Operation};

/// Presentation cue reported by a handler
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cue {
    /// Elements compared
    Compare,
    /// Elements exchanged
    Swap,
    /// Element reached its final place
    Sorted,
    /// Something highlighted
    Highlight,
    /// Entity added
    Add,
    /// Entity removed
    Remove,
    /// Playback reached the end
    Complete,
    /// Style-keyed cue without a dedicated variant
    Style(String),
}

impl Cue {
    /// Cue for an array style change
    #[must_use]
    pub fn for_style(style_key: &str) -> Self {
        match style_key {
            "compare" | "comparing" => Self::Compare,
            "swap" | "swapped" | "swapping" => Self::Swap,
            "sorted" => Self::Sorted,
            "highlight" => Self::Highlight,
            other => Self::Style(other.to_string()),
        }
    }
}

/// Why an operation changed nothing
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SkipReason {
    /// The primary structure has another shape
    #[error("expected a {expected} structure, found {found}")]
    WrongStructure {
        /// Shape the operation targets
        expected: &'static str,
        /// Shape of the primary structure
        found: DataKind,
    },

    /// A position is outside its sequence
    #[error("{what} index {index} out of range (len {len})")]
    OutOfRange {
        /// Addressed sequence
        what: &'static str,
        /// Requested position
        index: i64,
        /// Sequence length
        len: usize,
    },

    /// A referenced entity does not exist
    #[error("{what} `{id}` not found")]
    NotFound {
        /// Entity kind
        what: &'static str,
        /// Entity id
        id: String,
    },

    /// The operation targets a view other than the primary one
    #[error("view `{target}` is not the primary view `{primary}`")]
    ForeignView {
        /// Requested view
        target: String,
        /// Primary view
        primary: String,
    },

    /// No downward path between two tree nodes
    #[error("no path from `{from}` to `{to}`")]
    NoPath {
        /// Path start
        from: String,
        /// Path end
        to: String,
    },

    /// Parameters describe nothing to do
    #[error("{0}")]
    Empty(&'static str),

    /// Name outside the vocabulary
    #[error("unknown operation `{0}`")]
    Unknown(String),
}

/// Result of applying one operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpOutcome {
    /// State or overlays changed
    Applied(Option<Cue>),
    /// Nothing changed
    Skipped(SkipReason),
}

impl OpOutcome {
    /// Applied without a cue
    pub(crate) const DONE: Self = Self::Applied(None);

    pub(crate) fn cue(cue: Cue) -> Self {
        Self::Applied(Some(cue))
    }

    pub(crate) fn wrong_structure(expected: &'static str, found: DataKind) -> Self {
        Self::Skipped(SkipReason::WrongStructure { expected, found })
    }

    pub(crate) fn not_found(what: &'static str, id: impl ToString) -> Self {
        Self::Skipped(SkipReason::NotFound {
            what,
            id: id.to_string(),
        })
    }

    /// Whether the operation changed anything
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }
}

/// Apply one operation to the store
pub fn apply(store: &mut StateStore, op: &Operation) -> OpOutcome {
    tracing::trace!(op = op.name(), "dispatch");
    match op {
        Operation::UpdateStyle(p) => array::update_style(store, p),
        Operation::UpdateValues(p) => array::update_values(store, p),
        Operation::MoveElements(p) => array::move_elements(store, p),
        Operation::UpdateBoundary(p) => array::update_boundary(store, p),
        Operation::RemoveBoundary(p) => array::remove_boundary(store, p),

        Operation::UpdateNodeStyle(p) => graph::update_node_style(store, p),
        Operation::UpdateNodeProperties(p) => graph::update_node_properties(store, p),
        Operation::UpdateEdgeStyle(p) => graph::update_edge_style(store, p),
        Operation::AddNode(p) => graph::add_node(store, p),
        Operation::RemoveNode(p) => graph::remove_node(store, p),
        Operation::AddEdge(p) => graph::add_edge(store, p),
        Operation::RemoveEdge(p) => graph::remove_edge(store, p),

        Operation::UpdateTableCell(p) => table::update_table_cell(store, p),
        Operation::HighlightTableCell(p) => table::highlight_table_cell(store, p),
        Operation::ShowDependency(p) => table::show_dependency(store, p),

        Operation::AddChild(p) => tree::add_child(store, p),
        Operation::RemoveChild(p) => tree::remove_child(store, p),
        Operation::Reparent(p) => tree::reparent(store, p),
        Operation::SwapNodes(p) => tree::swap_nodes(store, p),
        Operation::HighlightPath(p) => tree::highlight_path(store, p),

        Operation::InsertIntoBucket(p) => hashtable::insert_into_bucket(store, p),
        Operation::UpdateInBucket(p) => hashtable::update_in_bucket(store, p),
        Operation::RemoveFromBucket(p) => hashtable::remove_from_bucket(store, p),
        Operation::ShowHash(p) => hashtable::show_hash(store, p),
        Operation::HighlightCollision(p) => hashtable::highlight_collision(store, p),
        Operation::HighlightBucket(p) => hashtable::highlight_bucket(store, p),

        Operation::AppendToList(p) => list::append_to_list(store, p),
        Operation::PopFromList(p) => list::pop_from_list(store, p),
        Operation::ClearList(p) => list::clear_list(store, p),

        Operation::ShowComment(p) => comment::show_comment(store, p),

        Operation::Unknown { name, .. } => OpOutcome::Skipped(SkipReason::Unknown(name.clone())),
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::{run, store};
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unknown_operation_is_skipped() {
        let mut s = store(json!({"type": "array", "structure": []}));
        let before = s.clone();
        let outcome = run(&mut s, "rotateLeft", json!({"node": 1}));
        assert_eq!(outcome, OpOutcome::Skipped(SkipReason::Unknown("rotateLeft".to_string())));
        assert_eq!(s, before);
    }

    #[test]
    fn test_wrong_structure_is_skipped() {
        let mut s = store(json!({"type": "array", "structure": []}));
        let outcome = run(&mut s, "addEdge", json!({"edge": {"from": "a", "to": "b"}}));
        assert!(matches!(
            outcome,
            OpOutcome::Skipped(SkipReason::WrongStructure { expected: "graph", found: DataKind::Array })
        ));
    }

    #[test]
    fn test_style_cues() {
        assert_eq!(Cue::for_style("comparing"), Cue::Compare);
        assert_eq!(Cue::for_style("swapped"), Cue::Swap);
        assert_eq!(Cue::for_style("sorted"), Cue::Sorted);
        assert_eq!(Cue::for_style("pivot"), Cue::Style("pivot".to_string()));
    }

    #[test]
    fn test_skip_reason_display() {
        let reason = SkipReason::OutOfRange {
            what: "bucket",
            index: 9,
            len: 4,
        };
        assert_eq!(reason.to_string(), "bucket index 9 out of range (len 4)");
    }
}
