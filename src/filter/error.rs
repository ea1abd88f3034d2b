use thiserror::Error;

/// Errors raised while compiling a display filter
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParserError {
    #[error("Error parsing display filter '{filter}': {reason} at position {position}")]
    Syntax {
        filter: String,
        position: usize,
        reason: String,
    },

    #[error("Unknown field '{field}' in display filter '{filter}'")]
    UnknownField { filter: String, field: String },

    #[error("Unknown function '{name}' in display filter '{filter}'")]
    UnknownFunction { filter: String, name: String },

    #[error("Mismatched quotes in display filter '{filter}' at position {position}")]
    MismatchedQuotes { filter: String, position: usize },

    #[error("Invalid slice in display filter '{filter}': {reason}")]
    InvalidSlice { filter: String, reason: String },

    #[error("Invalid address range in display filter '{filter}': {reason}")]
    InvalidAddress { filter: String, reason: String },
}

impl ParserError {
    /// The filter text that failed to parse
    pub fn filter(&self) -> &str {
        match self {
            ParserError::Syntax { filter, .. }
            | ParserError::UnknownField { filter, .. }
            | ParserError::UnknownFunction { filter, .. }
            | ParserError::MismatchedQuotes { filter, .. }
            | ParserError::InvalidSlice { filter, .. }
            | ParserError::InvalidAddress { filter, .. } => filter,
        }
    }
}

/// Errors raised by the slice engine
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SliceError {
    #[error("Slice index {index} out of range for {len} parts")]
    IndexOutOfRange { index: i64, len: usize },

    #[error("Cannot slice a value of type {0}")]
    Unsliceable(&'static str),
}

/// Error returned by a unary filter function
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{0}")]
pub struct FunctionError(pub String);

/// Errors raised while evaluating a parsed filter against a record
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaluationError {
    #[error("Malformed filter tree: {0}")]
    MalformedTree(String),

    #[error(transparent)]
    Slice(#[from] SliceError),

    #[error("Function '{name}' failed: {message}")]
    Function { name: String, message: String },
}

impl EvaluationError {
    /// Structural errors invalidate the whole filter pass; the others only
    /// concern the record being evaluated.
    pub fn is_structural(&self) -> bool {
        matches!(self, EvaluationError::MalformedTree(_))
    }
}
