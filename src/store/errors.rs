//! # Store Errors
//!
//! Error types for the storage collaborator.

use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Storage errors
#[derive(Debug, Error)]
pub enum StoreError {
    // ==================
    // Usage Errors
    // ==================
    /// Database does not exist
    #[error("Database '{0}' does not exist")]
    DatabaseNotFound(String),

    /// Resource does not exist in the database
    #[error("Resource '{resource}' does not exist in database '{database}'")]
    ResourceNotFound { database: String, resource: String },

    /// Revision number outside the committed range
    #[error("Revision {revision} does not exist (most recent revision is {most_recent})")]
    RevisionNotFound { revision: u32, most_recent: u32 },

    // ==================
    // Storage Failures
    // ==================
    /// Persisted resource data is inconsistent
    #[error("Invalid resource data: {0}")]
    InvalidData(String),

    /// Underlying I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Usage errors name something that does not exist; they surface as
    /// not-found rather than as server failures.
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            StoreError::DatabaseNotFound(_)
                | StoreError::ResourceNotFound { .. }
                | StoreError::RevisionNotFound { .. }
        )
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::InvalidData(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_classification() {
        assert!(StoreError::DatabaseNotFound("db".into()).is_usage_error());
        assert!(StoreError::RevisionNotFound {
            revision: 9,
            most_recent: 3
        }
        .is_usage_error());
        assert!(!StoreError::InvalidData("bad".into()).is_usage_error());
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk");
        assert!(!StoreError::from(io).is_usage_error());
    }

    #[test]
    fn test_messages_name_the_missing_thing() {
        let err = StoreError::ResourceNotFound {
            database: "books".into(),
            resource: "catalog".into(),
        };
        assert_eq!(
            err.to_string(),
            "Resource 'catalog' does not exist in database 'books'"
        );
    }
}
