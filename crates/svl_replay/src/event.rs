//! Events published by the engine.

use crate::handlers::Cue;
use serde::Serialize;
use svl_core::Frame;

/// Observable engine event
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    /// A trace was loaded, or the frame was restored to the initial one
    StateInitialized {
        /// Fresh frame
        frame: Frame,
    },
    /// A delta was committed
    FrameAdvanced {
        /// Number of deltas applied so far
        index: usize,
        /// Number of deltas in the trace
        total: usize,
    },
    /// The pseudocode line changed
    CodeHighlightChanged {
        /// New line, if any
        line: Option<i64>,
    },
    /// A known operation changed nothing
    OperationSkipped {
        /// Delta index
        delta: usize,
        /// Operation name
        name: String,
        /// Why
        reason: String,
    },
    /// Presentation cue
    Cue {
        /// The cue
        cue: Cue,
    },
}
