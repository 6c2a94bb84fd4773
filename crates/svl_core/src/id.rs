//! Identifiers for trace entities.
//!
//! Trace producers write node ids either as strings or as integers, so
//! ids keep whichever form they were recorded with.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Node identifier for graph and tree structures
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    /// Integer id
    Int(i64),
    /// String id
    Str(String),
}

impl EntityId {
    /// Get as string slice if this is a string id
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            Self::Int(_) => None,
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{}", n),
            Self::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<i64> for EntityId {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

/// Table cell coordinate within a view
///
/// Coordinates are signed so that negative positions survive loading
/// and are dropped as out of range when applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellRef {
    /// Row index
    pub row: i64,
    /// Column index
    pub col: i64,
}

impl CellRef {
    /// Create a new cell reference
    #[must_use]
    pub const fn new(row: i64, col: i64) -> Self {
        Self { row, col }
    }

    /// Manhattan distance to another cell
    #[must_use]
    pub fn distance(&self, other: &CellRef) -> u64 {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.row, self.col)
    }
}

/// Resolve a signed position against a sequence length.
#[must_use]
pub fn slot(len: usize, index: i64) -> Option<usize> {
    usize::try_from(index).ok().filter(|&i| i < len)
}
