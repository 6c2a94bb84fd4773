//! Frame model: the data structure snapshot a trace mutates.
//!
//! A [`Frame`] holds the primary [`DataState`] plus any auxiliary list
//! views. The primary payload is typed per [`DataKind`]; values stored
//! in elements, cells and buckets stay as raw JSON because producers put
//! numbers, strings and nested records there interchangeably.

use crate::error::ValidationError;
use crate::id::EntityId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The live state of a trace at some step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Primary data structure
    pub data_state: DataState,
    /// Auxiliary views, created lazily by list operations
    #[serde(default)]
    pub auxiliary_views: Vec<AuxiliaryView>,
    /// Current pseudocode line
    #[serde(default)]
    pub code_highlight: Option<i64>,
    /// Pseudocode listing carried by the frame, overriding the algorithm's
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pseudocode: Option<Vec<String>>,
}

impl Frame {
    /// Create a frame around a data state
    #[must_use]
    pub fn new(data_state: DataState) -> Self {
        Self {
            data_state,
            auxiliary_views: Vec::new(),
            code_highlight: None,
            pseudocode: None,
        }
    }

    /// Set the initial code highlight
    #[must_use]
    pub fn with_code_highlight(mut self, line: i64) -> Self {
        self.code_highlight = Some(line);
        self
    }

    /// Add an auxiliary view
    #[must_use]
    pub fn with_aux_view(mut self, view: AuxiliaryView) -> Self {
        self.auxiliary_views.push(view);
        self
    }
}

/// Kind of primary data structure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataKind {
    /// Flat array of elements
    Array,
    /// Node/edge graph
    Graph,
    /// Rooted tree with parent pointers and child lists
    Tree,
    /// 2-D table, also written `dp` or `dp_table`
    Table,
    /// Bucketed hash table
    Hashtable,
}

impl DataKind {
    /// Every document spelling accepted for `data_state.type`
    pub const SPELLINGS: &'static [&'static str] =
        &["array", "graph", "tree", "table", "dp", "dp_table", "hashtable"];

    /// Parse a document spelling
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "array" => Some(Self::Array),
            "graph" => Some(Self::Graph),
            "tree" => Some(Self::Tree),
            "table" | "dp" | "dp_table" => Some(Self::Table),
            "hashtable" => Some(Self::Hashtable),
            _ => None,
        }
    }

    /// Canonical spelling
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Array => "array",
            Self::Graph => "graph",
            Self::Tree => "tree",
            Self::Table => "table",
            Self::Hashtable => "hashtable",
        }
    }
}

impl std::fmt::Display for DataKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Array element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayElement {
    /// Element value
    #[serde(default)]
    pub value: Value,
    /// Presentation state tag
    #[serde(rename = "styleKey", default, skip_serializing_if = "Option::is_none")]
    pub style_key: Option<String>,
    /// Fields the engine does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ArrayElement {
    /// Create an element with a value and style
    #[must_use]
    pub fn new(value: impl Into<Value>, style_key: &str) -> Self {
        Self {
            value: value.into(),
            style_key: Some(style_key.to_string()),
            extra: Map::new(),
        }
    }
}

/// Graph or tree node
///
/// Graph nodes leave `parent` and `children` empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Node id
    pub id: EntityId,
    /// Display label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<Value>,
    /// Presentation state tag
    #[serde(rename = "styleKey", default, skip_serializing_if = "Option::is_none")]
    pub style_key: Option<String>,
    /// Free-form properties
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Map<String, Value>>,
    /// Parent id (trees)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<EntityId>,
    /// Child ids in order (trees)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<EntityId>,
    /// Fields the engine does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Node {
    /// Create a bare node
    #[must_use]
    pub fn new(id: impl Into<EntityId>) -> Self {
        Self {
            id: id.into(),
            label: None,
            style_key: None,
            properties: None,
            parent: None,
            children: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Set the label
    #[must_use]
    pub fn with_label(mut self, label: impl Into<Value>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the parent
    #[must_use]
    pub fn with_parent(mut self, parent: impl Into<EntityId>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Set the children
    #[must_use]
    pub fn with_children<I, T>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<EntityId>,
    {
        self.children = children.into_iter().map(Into::into).collect();
        self
    }
}

/// Graph edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Source node
    pub from: EntityId,
    /// Target node
    pub to: EntityId,
    /// Presentation state tag
    #[serde(rename = "styleKey", default, skip_serializing_if = "Option::is_none")]
    pub style_key: Option<String>,
    /// Edge weight
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<Value>,
    /// Edge label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<Value>,
    /// Fields the engine does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Edge {
    /// Create an edge between two nodes
    #[must_use]
    pub fn new(from: impl Into<EntityId>, to: impl Into<EntityId>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            style_key: None,
            weight: None,
            label: None,
            extra: Map::new(),
        }
    }

    /// Whether this edge connects `from` to `to` (directed)
    #[must_use]
    pub fn connects(&self, from: &EntityId, to: &EntityId) -> bool {
        &self.from == from && &self.to == to
    }
}

/// Graph payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphStructure {
    /// Nodes
    #[serde(default)]
    pub nodes: Vec<Node>,
    /// Edges
    #[serde(default)]
    pub edges: Vec<Edge>,
    /// Fields the engine does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Tree payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TreeStructure {
    /// Designated root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<EntityId>,
    /// Nodes
    #[serde(default)]
    pub nodes: Vec<Node>,
    /// Fields the engine does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Key/value pair stored in a bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketItem {
    /// Item key
    pub key: Value,
    /// Item value
    #[serde(default)]
    pub value: Value,
}

/// Hash bucket
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    /// Chained items
    #[serde(default)]
    pub items: Vec<BucketItem>,
    /// Fields the engine does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Hash table payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HashStructure {
    /// Buckets, addressed by index
    #[serde(default)]
    pub buckets: Vec<Bucket>,
    /// Fields the engine does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Typed primary payload
#[derive(Debug, Clone, PartialEq)]
pub enum Structure {
    /// Array elements
    Array(Vec<ArrayElement>),
    /// Graph nodes and edges
    Graph(GraphStructure),
    /// Tree nodes
    Tree(TreeStructure),
    /// Table rows
    Table(Vec<Vec<Value>>),
    /// Hash buckets
    Hashtable(HashStructure),
}

impl Structure {
    /// Kind of this payload
    #[must_use]
    pub const fn kind(&self) -> DataKind {
        match self {
            Self::Array(_) => DataKind::Array,
            Self::Graph(_) => DataKind::Graph,
            Self::Tree(_) => DataKind::Tree,
            Self::Table(_) => DataKind::Table,
            Self::Hashtable(_) => DataKind::Hashtable,
        }
    }

    /// Node list of a graph or tree
    #[must_use]
    pub fn nodes(&self) -> Option<&[Node]> {
        match self {
            Self::Graph(g) => Some(&g.nodes),
            Self::Tree(t) => Some(&t.nodes),
            _ => None,
        }
    }

    /// Mutable node list of a graph or tree
    pub fn nodes_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Self::Graph(g) => Some(&mut g.nodes),
            Self::Tree(t) => Some(&mut t.nodes),
            _ => None,
        }
    }

    /// Find a graph or tree node by id
    #[must_use]
    pub fn find_node(&self, id: &EntityId) -> Option<&Node> {
        self.nodes()?.iter().find(|n| &n.id == id)
    }
}

/// Row and column headers for table views
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableOptions {
    /// Row headers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_headers: Option<Vec<Value>>,
    /// Column headers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub col_headers: Option<Vec<Value>>,
}

/// Primary data structure of a frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDataState", into = "RawDataState")]
pub struct DataState {
    /// `type` as written in the document (`dp` and `table` both load as tables)
    pub type_name: String,
    /// Typed payload
    pub structure: Structure,
    /// Identifier of the primary view
    pub view_id: Option<String>,
    /// Table options
    pub options: Option<TableOptions>,
    /// Fields the engine does not interpret
    pub extra: Map<String, Value>,
}

impl DataState {
    /// Create a data state from a typed payload
    #[must_use]
    pub fn new(structure: Structure) -> Self {
        Self {
            type_name: structure.kind().as_str().to_string(),
            structure,
            view_id: None,
            options: None,
            extra: Map::new(),
        }
    }

    /// Set the primary view id
    #[must_use]
    pub fn with_view_id(mut self, view_id: &str) -> Self {
        self.view_id = Some(view_id.to_string());
        self
    }

    /// Kind of the primary structure
    #[must_use]
    pub const fn kind(&self) -> DataKind {
        self.structure.kind()
    }
}

/// Document form of [`DataState`]
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawDataState {
    #[serde(rename = "type")]
    type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    structure: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    view_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    options: Option<TableOptions>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

fn decode_payload<T>(field: &str, value: Option<Value>) -> Result<T, ValidationError>
where
    T: serde::de::DeserializeOwned + Default,
{
    match value {
        None | Some(Value::Null) => Ok(T::default()),
        Some(v) => serde_json::from_value(v).map_err(|e| ValidationError::Malformed {
            context: format!("data_state.{}", field),
            reason: e.to_string(),
        }),
    }
}

impl TryFrom<RawDataState> for DataState {
    type Error = ValidationError;

    fn try_from(raw: RawDataState) -> Result<Self, Self::Error> {
        let kind = DataKind::parse(&raw.type_name).ok_or_else(|| ValidationError::UnsupportedType {
            found: raw.type_name.clone(),
        })?;

        let structure = match kind {
            DataKind::Array => {
                // Arrays may be recorded under either key
                let (field, payload) = match raw.structure {
                    Some(v) if !v.is_null() => ("structure", Some(v)),
                    _ => ("data", raw.data),
                };
                Structure::Array(decode_payload(field, payload)?)
            }
            DataKind::Graph => Structure::Graph(decode_payload("structure", raw.structure)?),
            DataKind::Tree => Structure::Tree(decode_payload("structure", raw.structure)?),
            DataKind::Table => Structure::Table(decode_payload("data", raw.data)?),
            DataKind::Hashtable => Structure::Hashtable(decode_payload("structure", raw.structure)?),
        };

        Ok(Self {
            type_name: raw.type_name,
            structure,
            view_id: raw.view_id,
            options: raw.options,
            extra: raw.extra,
        })
    }
}

impl From<DataState> for RawDataState {
    fn from(state: DataState) -> Self {
        let (structure, data) = match state.structure {
            Structure::Array(items) => (serde_json::to_value(items).ok(), None),
            Structure::Graph(g) => (serde_json::to_value(g).ok(), None),
            Structure::Tree(t) => (serde_json::to_value(t).ok(), None),
            Structure::Table(rows) => (None, serde_json::to_value(rows).ok()),
            Structure::Hashtable(h) => (serde_json::to_value(h).ok(), None),
        };
        Self {
            type_name: state.type_name,
            structure,
            data,
            view_id: state.view_id,
            options: state.options,
            extra: state.extra,
        }
    }
}

/// Auxiliary list view, keyed by its own id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuxiliaryView {
    /// View id
    pub view_id: String,
    /// View kind (`list` for lazily created views)
    #[serde(rename = "type", default = "default_view_kind")]
    pub kind: String,
    /// Display title
    #[serde(default)]
    pub title: String,
    /// Entries
    #[serde(default)]
    pub data: Vec<Value>,
}

fn default_view_kind() -> String {
    "list".to_string()
}

impl AuxiliaryView {
    /// Create an empty view titled with its own id
    #[must_use]
    pub fn new(view_id: &str, kind: &str) -> Self {
        Self {
            view_id: view_id.to_string(),
            kind: kind.to_string(),
            title: view_id.to_string(),
            data: Vec::new(),
        }
    }
}
