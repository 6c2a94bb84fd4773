//! State store: the single mutable frame plus its overlays.

use crate::overlay::OverlayLayer;
use crate::view::DEFAULT_PRIMARY_VIEW;
use serde::{Deserialize, Serialize};
use svl_core::{AuxiliaryView, DataState, Frame};

/// Deep copy of the store at one point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Number of deltas applied
    pub frame_index: usize,
    /// Frame contents
    pub frame: Frame,
    /// Live overlays
    pub overlays: OverlayLayer,
}

/// Exclusive owner of the current frame
///
/// Readers get shared borrows; anything kept across a mutation must be
/// taken with [`StateStore::snapshot`].
#[derive(Debug, Clone, PartialEq)]
pub struct StateStore {
    frame: Frame,
    overlays: OverlayLayer,
}

impl StateStore {
    /// Create a store holding a copy of `initial`
    #[must_use]
    pub fn new(initial: &Frame) -> Self {
        Self {
            frame: initial.clone(),
            overlays: OverlayLayer::new(),
        }
    }

    /// Current frame
    #[must_use]
    pub fn current_state(&self) -> &Frame {
        &self.frame
    }

    /// Current auxiliary views
    #[must_use]
    pub fn current_aux_views(&self) -> &[AuxiliaryView] {
        &self.frame.auxiliary_views
    }

    /// Primary data state
    #[must_use]
    pub fn data_state(&self) -> &DataState {
        &self.frame.data_state
    }

    pub(crate) fn data_state_mut(&mut self) -> &mut DataState {
        &mut self.frame.data_state
    }

    pub(crate) fn aux_views_mut(&mut self) -> &mut Vec<AuxiliaryView> {
        &mut self.frame.auxiliary_views
    }

    /// Id of the primary view
    #[must_use]
    pub fn primary_view_id(&self) -> &str {
        self.frame
            .data_state
            .view_id
            .as_deref()
            .unwrap_or(DEFAULT_PRIMARY_VIEW)
    }

    /// Current pseudocode line
    #[must_use]
    pub fn code_highlight(&self) -> Option<i64> {
        self.frame.code_highlight
    }

    pub(crate) fn set_code_highlight(&mut self, line: Option<i64>) {
        self.frame.code_highlight = line;
    }

    /// Live overlays
    #[must_use]
    pub fn overlays(&self) -> &OverlayLayer {
        &self.overlays
    }

    pub(crate) fn overlays_mut(&mut self) -> &mut OverlayLayer {
        &mut self.overlays
    }

    /// Deep copy of the frame and overlays
    #[must_use]
    pub fn snapshot(&self, frame_index: usize) -> Snapshot {
        Snapshot {
            frame_index,
            frame: self.frame.clone(),
            overlays: self.overlays.clone(),
        }
    }

    /// Replace the frame with a copy of `initial` and drop every overlay
    pub fn restore(&mut self, initial: &Frame) {
        self.frame = initial.clone();
        self.overlays.clear();
    }
}
