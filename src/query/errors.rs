//! # Query Errors

use thiserror::Error;

use crate::store::StoreError;

/// Result type for query compilation and evaluation
pub type QueryResult<T> = Result<T, QueryError>;

/// Query errors
#[derive(Debug, Error)]
pub enum QueryError {
    // ==================
    // Static Errors
    // ==================
    /// Malformed query text
    #[error("Syntax error at offset {offset}: {message}")]
    Syntax { offset: usize, message: String },

    /// Call to a function that does not exist
    #[error("Unknown function '{0}'")]
    UnknownFunction(String),

    /// Wrong number of arguments
    #[error("Function '{name}' expects {expected} argument(s), got {actual}")]
    Arity {
        name: String,
        expected: &'static str,
        actual: usize,
    },

    // ==================
    // Dynamic Errors
    // ==================
    /// Operand of the wrong kind
    #[error("Type error: {0}")]
    Type(String),

    /// Relative expression evaluated without a context item
    #[error("Context item is undefined")]
    ContextUndefined,

    /// Storage failure while resolving `doc()` or `collection()`
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl QueryError {
    pub(crate) fn syntax(offset: usize, message: impl Into<String>) -> Self {
        QueryError::Syntax {
            offset,
            message: message.into(),
        }
    }
}
