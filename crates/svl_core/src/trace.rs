//! Trace documents and their loader.
//!
//! A [`Trace`] is immutable once loaded. Loading runs the structural
//! checks first (`algorithm`, a supported `initial_frame.data_state.type`,
//! `deltas` as a sequence) and then decodes every operation payload, so
//! any failure is reported before an engine sees the document.

use crate::error::ValidationError;
use crate::model::{DataKind, Frame};
use crate::op::{OpGroup, Operation, RawOperation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::io::Read;
use std::path::Path;

/// Algorithm metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Algorithm {
    /// Algorithm name
    #[serde(default = "default_algorithm_name")]
    pub name: String,
    /// Pseudocode listing, one line per entry
    #[serde(default)]
    pub pseudocode: Vec<String>,
    /// Fields the engine does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_algorithm_name() -> String {
    "Unknown".to_string()
}

impl Algorithm {
    /// Create algorithm metadata with a name
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            pseudocode: Vec::new(),
            extra: Map::new(),
        }
    }
}

/// One step of a trace
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Delta {
    /// Informational metadata
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Map<String, Value>>,
    /// New pseudocode line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_highlight: Option<i64>,
    /// Operation groups in document order
    pub operations: Vec<OpGroup>,
}

impl Delta {
    /// Create a delta from single operations
    #[must_use]
    pub fn from_ops(ops: impl IntoIterator<Item = Operation>) -> Self {
        Self {
            meta: None,
            code_highlight: None,
            operations: ops.into_iter().map(OpGroup::Single).collect(),
        }
    }

    /// Set the code highlight
    #[must_use]
    pub fn with_code_highlight(mut self, line: i64) -> Self {
        self.code_highlight = Some(line);
        self
    }

    /// Append a co-occurring group
    #[must_use]
    pub fn with_group(mut self, ops: Vec<Operation>) -> Self {
        self.operations.push(OpGroup::Group(ops));
        self
    }

    /// All operations, flattened in execution order
    pub fn ops(&self) -> impl Iterator<Item = &Operation> {
        self.operations.iter().flat_map(OpGroup::ops)
    }

    /// Total operation count
    #[must_use]
    pub fn op_count(&self) -> usize {
        self.operations.iter().map(|g| g.ops().len()).sum()
    }
}

/// The full recorded document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value")]
pub struct Trace {
    /// Algorithm metadata
    pub algorithm: Algorithm,
    /// State before the first delta
    pub initial_frame: Frame,
    /// Ordered steps
    pub deltas: Vec<Delta>,
}

impl Trace {
    /// Create a trace from parts
    #[must_use]
    pub fn new(algorithm: Algorithm, initial_frame: Frame, deltas: Vec<Delta>) -> Self {
        Self {
            algorithm,
            initial_frame,
            deltas,
        }
    }

    /// Number of deltas
    #[must_use]
    pub fn len(&self) -> usize {
        self.deltas.len()
    }

    /// Whether the trace has no deltas
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }

    /// Kind of the primary structure
    #[must_use]
    pub fn kind(&self) -> DataKind {
        self.initial_frame.data_state.kind()
    }

    /// Pseudocode listing; the frame's own listing wins over the algorithm's
    #[must_use]
    pub fn pseudocode(&self) -> &[String] {
        self.initial_frame
            .pseudocode
            .as_deref()
            .unwrap_or(&self.algorithm.pseudocode)
    }

    /// Load from a JSON value
    ///
    /// # Errors
    ///
    /// Returns error if required fields are absent, the data type is
    /// unsupported, or an operation payload does not match its schema
    pub fn from_value(value: Value) -> Result<Self, ValidationError> {
        let Value::Object(mut root) = value else {
            return Err(ValidationError::Malformed {
                context: "trace".to_string(),
                reason: "document root must be an object".to_string(),
            });
        };

        check_structure(&root)?;

        let algorithm = take(&mut root, "algorithm")?;
        let algorithm: Algorithm =
            serde_json::from_value(algorithm).map_err(|e| malformed("algorithm", e))?;

        let initial_frame = take(&mut root, "initial_frame")?;
        let initial_frame: Frame =
            serde_json::from_value(initial_frame).map_err(|e| malformed("initial_frame", e))?;

        let Value::Array(raw_deltas) = take(&mut root, "deltas")? else {
            return Err(ValidationError::NotASequence {
                field: "deltas".to_string(),
            });
        };

        let deltas = raw_deltas
            .into_iter()
            .enumerate()
            .map(|(i, raw)| decode_delta(i, raw))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            algorithm = %algorithm.name,
            deltas = deltas.len(),
            "trace decoded"
        );

        Ok(Self {
            algorithm,
            initial_frame,
            deltas,
        })
    }

    /// Load from a JSON string
    ///
    /// # Errors
    ///
    /// Returns error if the text is not JSON or fails validation
    pub fn from_json_str(text: &str) -> Result<Self, ValidationError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    /// Load from JSON bytes
    ///
    /// # Errors
    ///
    /// Returns error if the bytes are not JSON or fail validation
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ValidationError> {
        let value: Value = serde_json::from_slice(bytes)?;
        Self::from_value(value)
    }

    /// Load from a reader
    ///
    /// # Errors
    ///
    /// Returns error if reading fails or the document fails validation
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ValidationError> {
        let value: Value = serde_json::from_reader(reader)?;
        Self::from_value(value)
    }

    /// Load from a file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or fails validation
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ValidationError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| ValidationError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_slice(&bytes)
    }
}

impl TryFrom<Value> for Trace {
    type Error = ValidationError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

fn malformed(context: &str, err: serde_json::Error) -> ValidationError {
    ValidationError::Malformed {
        context: context.to_string(),
        reason: err.to_string(),
    }
}

fn missing(field: &str) -> ValidationError {
    ValidationError::MissingField {
        field: field.to_string(),
    }
}

fn take(root: &mut Map<String, Value>, field: &str) -> Result<Value, ValidationError> {
    root.remove(field).ok_or_else(|| missing(field))
}

/// Structural checks that run before any typed decoding
fn check_structure(root: &Map<String, Value>) -> Result<(), ValidationError> {
    match root.get("algorithm") {
        Some(Value::Object(_)) => {}
        Some(_) => {
            return Err(ValidationError::Malformed {
                context: "algorithm".to_string(),
                reason: "expected an object".to_string(),
            });
        }
        None => return Err(missing("algorithm")),
    }

    let frame = root.get("initial_frame").ok_or_else(|| missing("initial_frame"))?;
    let data_state = frame
        .get("data_state")
        .ok_or_else(|| missing("initial_frame.data_state"))?;
    let type_name = data_state
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| missing("initial_frame.data_state.type"))?;
    if DataKind::parse(type_name).is_none() {
        return Err(ValidationError::UnsupportedType {
            found: type_name.to_string(),
        });
    }

    match root.get("deltas") {
        Some(Value::Array(_)) => Ok(()),
        Some(_) => Err(ValidationError::NotASequence {
            field: "deltas".to_string(),
        }),
        None => Err(missing("deltas")),
    }
}

fn decode_delta(index: usize, raw: Value) -> Result<Delta, ValidationError> {
    let Value::Object(mut fields) = raw else {
        return Err(ValidationError::Malformed {
            context: format!("delta {}", index),
            reason: "expected an object".to_string(),
        });
    };

    let meta = match fields.remove("meta") {
        None | Some(Value::Null) => None,
        Some(Value::Object(map)) => Some(map),
        Some(_) => {
            return Err(ValidationError::Malformed {
                context: format!("delta {} meta", index),
                reason: "expected a mapping".to_string(),
            });
        }
    };

    let code_highlight = match fields.remove("code_highlight") {
        None | Some(Value::Null) => None,
        Some(v) => Some(v.as_i64().ok_or_else(|| ValidationError::Malformed {
            context: format!("delta {} code_highlight", index),
            reason: format!("expected an integer, got {}", v),
        })?),
    };

    let operations = match fields.remove("operations") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items,
        Some(_) => {
            return Err(ValidationError::NotASequence {
                field: format!("deltas[{}].operations", index),
            });
        }
    };

    let operations = operations
        .into_iter()
        .enumerate()
        .map(|(op, item)| match item {
            Value::Array(members) => members
                .into_iter()
                .enumerate()
                .map(|(member, m)| decode_op(index, op, Some(member), m))
                .collect::<Result<Vec<_>, _>>()
                .map(OpGroup::Group),
            single => decode_op(index, op, None, single).map(OpGroup::Single),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Delta {
        meta,
        code_highlight,
        operations,
    })
}

fn decode_op(
    delta: usize,
    op: usize,
    member: Option<usize>,
    raw: Value,
) -> Result<Operation, ValidationError> {
    let invalid = |name: &str, reason: String| ValidationError::InvalidOperation {
        delta,
        op,
        member,
        name: name.to_string(),
        reason,
    };

    let raw: RawOperation = serde_json::from_value(raw).map_err(|e| invalid("?", e.to_string()))?;
    Operation::decode(&raw.op, raw.params).map_err(|e| invalid(&raw.op, e.to_string()))
}
