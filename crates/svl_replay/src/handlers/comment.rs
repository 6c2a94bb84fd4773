//! Comment handler.

use super::{OpOutcome, SkipReason};
use crate::overlay::{CommentTarget, Overlay, OverlayCategory, OverlayShape};
use crate::store::StateStore;
use svl_core::op::{CommentAnchor, ShowComment};
use svl_core::EntityId;

fn node_exists(store: &StateStore, id: &EntityId) -> bool {
    store.data_state().structure.find_node(id).is_some()
}

pub(super) fn show_comment(store: &mut StateStore, p: &ShowComment) -> OpOutcome {
    if p.text.is_empty() {
        return OpOutcome::Skipped(SkipReason::Empty("empty comment"));
    }
    let reference = p.reference.clone().unwrap_or_default();

    let (category, target) = match p.anchor {
        CommentAnchor::Global => {
            // Only one global comment is live at a time
            store.overlays_mut().clear_category(OverlayCategory::GlobalComment);
            (OverlayCategory::GlobalComment, CommentTarget::Global)
        }
        CommentAnchor::Node => match reference.id {
            Some(id) => {
                let target = if node_exists(store, &id) {
                    CommentTarget::Node { id }
                } else {
                    CommentTarget::Unanchored
                };
                (OverlayCategory::NodeComment, target)
            }
            None => (OverlayCategory::Comment, CommentTarget::Unanchored),
        },
        CommentAnchor::Edge => match (reference.from, reference.to) {
            (Some(from), Some(to)) => {
                let target = if node_exists(store, &from) && node_exists(store, &to) {
                    CommentTarget::Edge { from, to }
                } else {
                    CommentTarget::Unanchored
                };
                (OverlayCategory::EdgeComment, target)
            }
            _ => (OverlayCategory::Comment, CommentTarget::Unanchored),
        },
        CommentAnchor::Free => (OverlayCategory::Comment, CommentTarget::Unanchored),
    };

    store.overlays_mut().push(Overlay::new(
        category,
        OverlayShape::Comment {
            text: p.text.clone(),
            target,
        },
    ));
    OpOutcome::DONE
}
