//! Overlay layer: non-structural annotations drawn over the frame.
//!
//! Overlays copy the ids and positions they refer to, so they never alias
//! live frame data. Each overlay has a category (used by the
//! clear-before-draw rules) and a scope deciding how long it lives.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use svl_core::{CellRef, EntityId};

/// Overlay category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OverlayCategory {
    /// Labelled range box over array positions
    Boundary,
    /// Table cell highlight
    CellHighlight,
    /// Table dependency connector
    DependencyArrow,
    /// The single global comment
    GlobalComment,
    /// Comment next to a node
    NodeComment,
    /// Comment at an edge midpoint
    EdgeComment,
    /// Comment without an anchor category
    Comment,
    /// Edge of a highlighted tree path
    PathEdge,
    /// Hash computation annotation
    HashAnnotation,
    /// Bucket collision marker
    Collision,
    /// Bucket highlight
    BucketHighlight,
}

impl OverlayCategory {
    /// Default scope for overlays of this category
    #[must_use]
    pub const fn default_scope(self) -> OverlayScope {
        match self {
            Self::PathEdge | Self::HashAnnotation | Self::Collision | Self::BucketHighlight => {
                OverlayScope::Delta
            }
            _ => OverlayScope::Persistent,
        }
    }
}

/// How long an overlay lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlayScope {
    /// Until explicitly cleared, reset, or a new load
    Persistent,
    /// Until the next delta begins
    Delta,
}

/// Table cell highlight style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellStyle {
    /// Default highlight
    Highlight,
    /// Cells being compared
    Compare,
    /// Cell being computed
    CurrentCell,
    /// Changed cell flash
    Flash,
}

impl CellStyle {
    /// Map a style key; unknown keys fall back to [`CellStyle::Highlight`]
    #[must_use]
    pub fn from_key(key: Option<&str>) -> Self {
        match key {
            Some("compare") => Self::Compare,
            Some("current_cell") => Self::CurrentCell,
            Some("flash" | "changed") => Self::Flash,
            _ => Self::Highlight,
        }
    }

    /// RGB color
    #[must_use]
    pub const fn color(self) -> u32 {
        match self {
            Self::Highlight => 0xffff00,
            Self::Compare => 0xffaa00,
            Self::CurrentCell => 0x00ff00,
            Self::Flash => 0xff0000,
        }
    }

    /// Fill opacity
    #[must_use]
    pub const fn opacity(self) -> f64 {
        match self {
            Self::Flash => 0.5,
            _ => 0.3,
        }
    }
}

/// Where a comment is placed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CommentTarget {
    /// Global slot
    Global,
    /// Anchored next to an existing node
    Node {
        /// Node id
        id: EntityId,
    },
    /// Anchored at the midpoint between two existing nodes
    Edge {
        /// Source node
        from: EntityId,
        /// Target node
        to: EntityId,
    },
    /// Placed without an anchor
    Unanchored,
}

/// Overlay geometry, in frame coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum OverlayShape {
    /// Box over array positions `start..=end`
    Boundary {
        /// Boundary key (`type` in the document)
        key: String,
        /// First position
        start: usize,
        /// Last position
        end: usize,
        /// Box style
        style_key: String,
        /// Caption
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
    /// Filled table cell
    Cell {
        /// Cell
        cell: CellRef,
        /// Highlight style
        style: CellStyle,
        /// RGB color
        color: u32,
        /// Fill opacity
        opacity: f64,
    },
    /// Connector between two table cells
    Connector {
        /// Source cell
        from: CellRef,
        /// Destination cell
        to: CellRef,
        /// Connector style
        #[serde(default, skip_serializing_if = "Option::is_none")]
        style_key: Option<String>,
    },
    /// Text comment
    Comment {
        /// Text
        text: String,
        /// Placement
        target: CommentTarget,
    },
    /// Highlighted edge between two tree nodes
    PathEdge {
        /// Upper node
        from: EntityId,
        /// Lower node
        to: EntityId,
        /// Edge style
        style_key: String,
    },
    /// `key -> hash` annotation over a bucket
    Hash {
        /// Bucket position
        bucket: usize,
        /// Hashed key
        input_key: Value,
        /// Hash value
        output_hash: Value,
    },
    /// Marker over a bucket
    Bucket {
        /// Bucket position
        bucket: usize,
    },
}

/// A single overlay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overlay {
    /// Category
    pub category: OverlayCategory,
    /// Lifetime
    pub scope: OverlayScope,
    /// Geometry
    #[serde(flatten)]
    pub shape: OverlayShape,
}

impl Overlay {
    /// Create an overlay with its category's default scope
    #[must_use]
    pub fn new(category: OverlayCategory, shape: OverlayShape) -> Self {
        Self {
            category,
            scope: category.default_scope(),
            shape,
        }
    }
}

/// Ordered collection of live overlays
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OverlayLayer {
    items: Vec<Overlay>,
}

impl OverlayLayer {
    /// Create an empty layer
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an overlay
    pub fn push(&mut self, overlay: Overlay) {
        self.items.push(overlay);
    }

    /// Remove every overlay of a category, returning how many were removed
    pub fn clear_category(&mut self, category: OverlayCategory) -> usize {
        let before = self.items.len();
        self.items.retain(|o| o.category != category);
        before - self.items.len()
    }

    /// Remove every overlay of a scope, returning how many were removed
    pub fn clear_scope(&mut self, scope: OverlayScope) -> usize {
        let before = self.items.len();
        self.items.retain(|o| o.scope != scope);
        before - self.items.len()
    }

    /// Keep only overlays matching the predicate, returning how many were removed
    pub fn retain<F>(&mut self, keep: F) -> usize
    where
        F: FnMut(&Overlay) -> bool,
    {
        let before = self.items.len();
        self.items.retain(keep);
        before - self.items.len()
    }

    /// Remove everything
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Overlays of a category, in creation order
    pub fn by_category(&self, category: OverlayCategory) -> impl Iterator<Item = &Overlay> {
        self.items.iter().filter(move |o| o.category == category)
    }

    /// Number of overlays in a category
    #[must_use]
    pub fn count(&self, category: OverlayCategory) -> usize {
        self.by_category(category).count()
    }

    /// All overlays, in creation order
    #[must_use]
    pub fn as_slice(&self) -> &[Overlay] {
        &self.items
    }

    /// Number of live overlays
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether no overlay is live
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
