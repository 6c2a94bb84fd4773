//! Typed operation vocabulary.
//!
//! Every operation name maps to one [`Operation`] variant with its own
//! payload struct. Payloads are decoded when the trace is loaded, so a
//! malformed payload is reported with its delta and operation index
//! instead of surfacing halfway through playback. Names outside the
//! vocabulary decode to [`Operation::Unknown`] and are skipped at apply
//! time.

use crate::id::{CellRef, EntityId};
use crate::model::{BucketItem, Edge, Node};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------
// Array
// ---------------------------------------------------------------------

/// `updateStyle`: set the style of addressed array elements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateStyle {
    /// Element positions
    #[serde(default)]
    pub indices: Vec<i64>,
    /// Style to apply
    #[serde(rename = "styleKey")]
    pub style_key: String,
}

/// One `updateValues` entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueUpdate {
    /// Element position
    pub index: i64,
    /// New value
    #[serde(default)]
    pub value: Value,
}

/// `updateValues`: overwrite element values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateValues {
    /// Updates in order
    #[serde(default)]
    pub updates: Vec<ValueUpdate>,
}

/// One `moveElements` pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovePair {
    /// Source position in the pre-move array
    #[serde(rename = "fromIndex", alias = "from")]
    pub from_index: i64,
    /// Destination position
    #[serde(rename = "toIndex", alias = "to")]
    pub to_index: i64,
}

/// `moveElements`: simultaneous moves read from a pre-move snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveElements {
    /// Moves
    #[serde(default)]
    pub pairs: Vec<MovePair>,
}

fn default_boundary_style() -> String {
    "boundary".to_string()
}

/// `updateBoundary`: draw a labelled range overlay keyed by `type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateBoundary {
    /// Overlay key
    #[serde(rename = "type")]
    pub kind: String,
    /// `[start, end]`, inclusive
    #[serde(default)]
    pub range: Vec<i64>,
    /// Style of the box
    #[serde(rename = "styleKey", default = "default_boundary_style")]
    pub style_key: String,
    /// Caption
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// `removeBoundary`: drop every boundary overlay with this key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoveBoundary {
    /// Overlay key
    #[serde(rename = "type")]
    pub kind: String,
}

// ---------------------------------------------------------------------
// Graph
// ---------------------------------------------------------------------

/// `updateNodeStyle`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateNodeStyle {
    /// Node ids
    #[serde(default)]
    pub ids: Vec<EntityId>,
    /// Style to apply
    #[serde(rename = "styleKey")]
    pub style_key: String,
}

/// One `updateNodeProperties` entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyUpdate {
    /// Node id
    pub id: EntityId,
    /// Properties merged over the existing ones
    #[serde(default)]
    pub properties: Map<String, Value>,
}

/// `updateNodeProperties`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateNodeProperties {
    /// Updates in order
    #[serde(default)]
    pub updates: Vec<PropertyUpdate>,
}

/// Directed edge reference
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeRef {
    /// Source node
    pub from: EntityId,
    /// Target node
    pub to: EntityId,
}

/// `updateEdgeStyle`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateEdgeStyle {
    /// Edges to restyle
    #[serde(default)]
    pub edges: Vec<EdgeRef>,
    /// Style to apply
    #[serde(rename = "styleKey")]
    pub style_key: String,
}

/// `addNode`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddNode {
    /// Node to append
    pub node: Node,
}

/// `removeNode`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoveNode {
    /// Node id
    pub id: EntityId,
}

/// `addEdge`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddEdge {
    /// Edge to append
    pub edge: Edge,
}

/// `removeEdge`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoveEdge {
    /// Source node
    pub from: EntityId,
    /// Target node
    pub to: EntityId,
}

// ---------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------

/// One `updateTableCell` entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellUpdate {
    /// Row
    pub row: i64,
    /// Column
    pub col: i64,
    /// New value
    #[serde(default)]
    pub value: Value,
}

/// `updateTableCell`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateTableCell {
    /// Target view, defaults to the primary view
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_id: Option<String>,
    /// Updates in order
    #[serde(default)]
    pub updates: Vec<CellUpdate>,
}

/// `highlightTableCell`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightTableCell {
    /// Target view, defaults to the primary view
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_id: Option<String>,
    /// Cells to highlight
    #[serde(default)]
    pub cells: Vec<CellRef>,
    /// Highlight style
    #[serde(rename = "styleKey", default, skip_serializing_if = "Option::is_none")]
    pub style_key: Option<String>,
}

/// `showDependency`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShowDependency {
    /// Target view, defaults to the primary view
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_id: Option<String>,
    /// Source cells
    #[serde(default)]
    pub from_cells: Vec<CellRef>,
    /// Destination cell
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_cell: Option<CellRef>,
    /// Connector style
    #[serde(rename = "styleKey", default, skip_serializing_if = "Option::is_none")]
    pub style_key: Option<String>,
}

// ---------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------

/// `addChild`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddChild {
    /// Parent id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<EntityId>,
    /// Node to append
    pub node: Node,
}

/// `removeChild`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoveChild {
    /// Parent id
    pub parent_id: EntityId,
    /// Child id
    pub child_id: EntityId,
}

/// `reparent`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reparent {
    /// Node to move
    pub node_id: EntityId,
    /// New parent; absent makes the node the root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_parent_id: Option<EntityId>,
    /// Insert position among the new parent's children
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<i64>,
}

/// `swapNodes`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapNodes {
    /// First node
    pub a_id: EntityId,
    /// Second node
    pub b_id: EntityId,
    /// Also exchange child lists
    #[serde(default)]
    pub swap_children: bool,
}

/// `highlightPath`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightPath {
    /// Path start
    pub from_id: EntityId,
    /// Path end
    pub to_id: EntityId,
    /// Style of the path edges
    #[serde(rename = "styleKey", default, skip_serializing_if = "Option::is_none")]
    pub style_key: Option<String>,
}

// ---------------------------------------------------------------------
// Hashtable
// ---------------------------------------------------------------------

/// `insertIntoBucket`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsertIntoBucket {
    /// Bucket position
    pub bucket_index: i64,
    /// Item to append
    pub element: BucketItem,
}

/// `updateInBucket`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateInBucket {
    /// Bucket position
    pub bucket_index: i64,
    /// Item key
    pub key: Value,
    /// New value
    #[serde(default)]
    pub value: Value,
}

/// `removeFromBucket`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoveFromBucket {
    /// Bucket position
    pub bucket_index: i64,
    /// Item key
    pub key: Value,
}

/// `showHash`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShowHash {
    /// Bucket position
    pub bucket_index: i64,
    /// Hashed key
    #[serde(default)]
    pub input_key: Value,
    /// Hash value
    #[serde(default)]
    pub output_hash: Value,
}

/// `highlightCollision` and `highlightBucket`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketTarget {
    /// Bucket position
    pub bucket_index: i64,
}

// ---------------------------------------------------------------------
// List
// ---------------------------------------------------------------------

/// `appendToList`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppendToList {
    /// View id
    pub view_id: String,
    /// Entry to push
    #[serde(default)]
    pub value: Value,
}

/// End of a list to pop from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ListEnd {
    /// First entry
    Head,
    /// Last entry
    Tail,
    /// Any other spelling; pops nothing
    Unspecified,
}

impl From<String> for ListEnd {
    fn from(s: String) -> Self {
        match s.as_str() {
            "head" => Self::Head,
            "tail" => Self::Tail,
            _ => Self::Unspecified,
        }
    }
}

impl From<ListEnd> for String {
    fn from(end: ListEnd) -> Self {
        match end {
            ListEnd::Head => "head",
            ListEnd::Tail => "tail",
            ListEnd::Unspecified => "unspecified",
        }
        .to_string()
    }
}

/// `popFromList`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopFromList {
    /// View id
    pub view_id: String,
    /// End to pop from when no value is given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<ListEnd>,
    /// Entry to remove by value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

/// `clearList`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClearList {
    /// View id
    pub view_id: String,
}

// ---------------------------------------------------------------------
// Common
// ---------------------------------------------------------------------

/// Where a comment is positioned
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CommentAnchor {
    /// Single global slot
    #[default]
    Global,
    /// Next to a node
    Node,
    /// At the midpoint of an edge
    Edge,
    /// Any other spelling; placed without anchoring
    Free,
}

impl From<String> for CommentAnchor {
    fn from(s: String) -> Self {
        match s.as_str() {
            "global" => Self::Global,
            "node" => Self::Node,
            "edge" => Self::Edge,
            _ => Self::Free,
        }
    }
}

impl From<CommentAnchor> for String {
    fn from(anchor: CommentAnchor) -> Self {
        match anchor {
            CommentAnchor::Global => "global",
            CommentAnchor::Node => "node",
            CommentAnchor::Edge => "edge",
            CommentAnchor::Free => "free",
        }
        .to_string()
    }
}

/// Entity a comment refers to
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommentRef {
    /// Node id (node anchor)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    /// Edge source (edge anchor)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<EntityId>,
    /// Edge target (edge anchor)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<EntityId>,
}

/// `showComment`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShowComment {
    /// Comment text
    #[serde(default)]
    pub text: String,
    /// Placement
    #[serde(default)]
    pub anchor: CommentAnchor,
    /// Referenced entity
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<CommentRef>,
}

// ---------------------------------------------------------------------
// Vocabulary
// ---------------------------------------------------------------------

macro_rules! vocabulary {
    ($( $(#[$doc:meta])* $variant:ident($payload:ty) => $name:literal, )*) => {
        /// A single named mutation with its typed payload
        #[derive(Debug, Clone, PartialEq)]
        pub enum Operation {
            $( $(#[$doc])* $variant($payload), )*
            /// Name outside the vocabulary; skipped when applied
            Unknown {
                /// Name as written in the document
                name: String,
                /// Raw payload
                params: Value,
            },
        }

        impl Operation {
            /// Every operation name the engine understands
            pub const VOCABULARY: &'static [&'static str] = &[$($name),*];

            /// Operation name as written in trace documents
            #[must_use]
            pub fn name(&self) -> &str {
                match self {
                    $( Self::$variant(_) => $name, )*
                    Self::Unknown { name, .. } => name,
                }
            }

            /// Decode a named payload
            ///
            /// # Errors
            ///
            /// Returns error if the payload does not match the schema of a
            /// known operation. Unknown names never fail.
            pub fn decode(name: &str, params: Value) -> Result<Self, serde_json::Error> {
                let params = match params {
                    Value::Null => Value::Object(Map::new()),
                    other => other,
                };
                Ok(match name {
                    $( $name => Self::$variant(serde_json::from_value(params)?), )*
                    _ => Self::Unknown {
                        name: name.to_string(),
                        params,
                    },
                })
            }

            /// Payload in document form
            #[must_use]
            pub fn params(&self) -> Value {
                match self {
                    $( Self::$variant(p) => serde_json::to_value(p).unwrap_or(Value::Null), )*
                    Self::Unknown { params, .. } => params.clone(),
                }
            }
        }
    };
}

vocabulary! {
    /// Set array element styles
    UpdateStyle(UpdateStyle) => "updateStyle",
    /// Overwrite array element values
    UpdateValues(UpdateValues) => "updateValues",
    /// Move array elements
    MoveElements(MoveElements) => "moveElements",
    /// Add a boundary overlay
    UpdateBoundary(UpdateBoundary) => "updateBoundary",
    /// Remove boundary overlays
    RemoveBoundary(RemoveBoundary) => "removeBoundary",
    /// Set node styles
    UpdateNodeStyle(UpdateNodeStyle) => "updateNodeStyle",
    /// Merge node properties
    UpdateNodeProperties(UpdateNodeProperties) => "updateNodeProperties",
    /// Set edge styles
    UpdateEdgeStyle(UpdateEdgeStyle) => "updateEdgeStyle",
    /// Append a node
    AddNode(AddNode) => "addNode",
    /// Remove a node
    RemoveNode(RemoveNode) => "removeNode",
    /// Append an edge
    AddEdge(AddEdge) => "addEdge",
    /// Remove an edge
    RemoveEdge(RemoveEdge) => "removeEdge",
    /// Write table cells
    UpdateTableCell(UpdateTableCell) => "updateTableCell",
    /// Highlight table cells
    HighlightTableCell(HighlightTableCell) => "highlightTableCell",
    /// Draw dependency connectors
    ShowDependency(ShowDependency) => "showDependency",
    /// Append a tree child
    AddChild(AddChild) => "addChild",
    /// Unlink a tree child
    RemoveChild(RemoveChild) => "removeChild",
    /// Move a tree node
    Reparent(Reparent) => "reparent",
    /// Exchange two tree nodes' contents
    SwapNodes(SwapNodes) => "swapNodes",
    /// Highlight a downward tree path
    HighlightPath(HighlightPath) => "highlightPath",
    /// Append a bucket item
    InsertIntoBucket(InsertIntoBucket) => "insertIntoBucket",
    /// Update a bucket item
    UpdateInBucket(UpdateInBucket) => "updateInBucket",
    /// Remove a bucket item
    RemoveFromBucket(RemoveFromBucket) => "removeFromBucket",
    /// Annotate a hash computation
    ShowHash(ShowHash) => "showHash",
    /// Mark a collision
    HighlightCollision(BucketTarget) => "highlightCollision",
    /// Highlight a bucket
    HighlightBucket(BucketTarget) => "highlightBucket",
    /// Push onto an auxiliary list
    AppendToList(AppendToList) => "appendToList",
    /// Pop from an auxiliary list
    PopFromList(PopFromList) => "popFromList",
    /// Empty an auxiliary list
    ClearList(ClearList) => "clearList",
    /// Show a comment
    ShowComment(ShowComment) => "showComment",
}

impl Operation {
    /// Whether the name is outside the vocabulary
    #[must_use]
    pub const fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown { .. })
    }
}

impl Serialize for Operation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        RawOperation {
            op: self.name().to_string(),
            params: self.params(),
        }
        .serialize(serializer)
    }
}

/// Document form of an operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct RawOperation {
    pub(crate) op: String,
    #[serde(default)]
    pub(crate) params: Value,
}

/// One element of a delta's operation list
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OpGroup {
    /// A lone operation
    Single(Operation),
    /// Co-occurring operations, still applied in document order
    Group(Vec<Operation>),
}

impl OpGroup {
    /// Operations of this group in document order
    #[must_use]
    pub fn ops(&self) -> &[Operation] {
        match self {
            Self::Single(op) => std::slice::from_ref(op),
            Self::Group(ops) => ops,
        }
    }
}
