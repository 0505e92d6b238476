//! # Serializer Errors

use thiserror::Error;

use crate::store::{NodeKey, StoreError};

/// Result type for serialization
pub type SerializeResult<T> = Result<T, SerializeError>;

/// Serialization errors
#[derive(Debug, Error)]
pub enum SerializeError {
    /// Start node exists in none of the requested revisions
    #[error("Node {0} does not exist in the requested revisions")]
    NodeNotFound(NodeKey),

    /// Storage failure while reading a revision
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Writing the output failed
    #[error("Output error: {0}")]
    Io(#[from] std::io::Error),
}
