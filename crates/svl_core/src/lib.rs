//! SVL Core Types
//!
//! The trace model consumed by the replay engine: frames, typed
//! operations, and trace validation. Pure types with no playback logic.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod id;
pub mod model;
pub mod op;
pub mod trace;

// Re-exports
pub use error::{CoreError, CoreResult, ValidationError};
pub use id::{slot, CellRef, EntityId};
pub use model::{
    ArrayElement, AuxiliaryView, Bucket, BucketItem, DataKind, DataState, Edge, Frame, GraphStructure,
    HashStructure, Node, Structure, TableOptions, TreeStructure,
};
pub use op::{OpGroup, Operation};
pub use trace::{Algorithm, Delta, Trace};
