//! SVL Replay Engine
//!
//! Owns the current frame of a trace and advances it one delta at a time.
//! Operations are dispatched to typed handlers; views are resolved through
//! the primary-view alias set; annotations live in an overlay layer next to
//! the frame.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod digest;
pub mod engine;
pub mod event;
pub mod handlers;
pub mod interpreter;
pub mod overlay;
pub mod store;
pub mod view;

pub use digest::TraceDigest;
pub use engine::{Engine, EngineConfig};
pub use event::EngineEvent;
pub use handlers::{apply, Cue, OpOutcome, SkipReason};
pub use interpreter::{DeltaInterpreter, SkippedOp, StepReport};
pub use overlay::{CellStyle, CommentTarget, Overlay, OverlayCategory, OverlayLayer, OverlayScope, OverlayShape};
pub use store::{Snapshot, StateStore};
pub use view::{ViewResolver, DEFAULT_PRIMARY_VIEW, PRIMARY_ALIASES};
