//! Core error types for SVL.

use std::fmt;

/// Core result type
pub type CoreResult<T> = Result<T, CoreError>;

/// Error raised while loading a trace document.
///
/// Loading fails before any engine state is touched, so a rejected
/// document never disturbs the frame that is currently displayed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A required field is absent
    #[error("missing required field `{field}`")]
    MissingField {
        /// Dotted path of the field
        field: String,
    },

    /// `initial_frame.data_state.type` is outside the supported set
    #[error("unsupported data structure type `{found}`")]
    UnsupportedType {
        /// Type name as written in the document
        found: String,
    },

    /// A field that must be a sequence is something else
    #[error("`{field}` must be a sequence")]
    NotASequence {
        /// Dotted path of the field
        field: String,
    },

    /// An operation payload does not match its schema
    #[error("delta {delta}, operation {}: `{name}`: {reason}", position(.op, .member))]
    InvalidOperation {
        /// Index of the delta in the trace
        delta: usize,
        /// Index of the operation group in the delta
        op: usize,
        /// Index inside a co-occurring group, if the group was a list
        member: Option<usize>,
        /// Operation name as written in the document
        name: String,
        /// Decoder message
        reason: String,
    },

    /// A section of the document has the wrong shape
    #[error("malformed {context}: {reason}")]
    Malformed {
        /// Section being decoded
        context: String,
        /// Decoder message
        reason: String,
    },

    /// The document is not valid JSON
    #[error("invalid JSON: {reason}")]
    Json {
        /// Parser message
        reason: String,
    },

    /// The document could not be read
    #[error("failed to read {path}: {reason}")]
    Io {
        /// File path
        path: String,
        /// OS error message
        reason: String,
    },
}

fn position(op: &usize, member: &Option<usize>) -> String {
    match member {
        Some(member) => format!("{op}.{member}"),
        None => op.to_string(),
    }
}

impl From<serde_json::Error> for ValidationError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json {
            reason: err.to_string(),
        }
    }
}

/// Core error type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Trace failed validation
    Validation(ValidationError),

    /// Invalid configuration
    InvalidConfig {
        /// What was wrong, naming the field or file
        reason: String,
    },
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "Validation failed: {}", err),
            Self::InvalidConfig { reason } => write!(f, "Invalid configuration: {}", reason),
        }
    }
}

impl std::error::Error for CoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::InvalidConfig { .. } => None,
        }
    }
}

impl From<ValidationError> for CoreError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err)
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Validation(err.into())
    }
}
