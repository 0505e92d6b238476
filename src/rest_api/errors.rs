//! # REST API Errors
//!
//! Error types for the read gateway. Every variant maps to one status code;
//! bodies are plain text.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

use crate::auth::AuthError;
use crate::query::QueryError;
use crate::serialize::SerializeError;
use crate::store::StoreError;

/// Result type for REST operations
pub type RestResult<T> = Result<T, RestError>;

/// Body sent for every 5xx response
pub const INTERNAL_ERROR_BODY: &str = "Internal server error";

/// REST API errors
#[derive(Debug, Clone, Error)]
pub enum RestError {
    // ==================
    // Client Errors (4xx)
    // ==================
    /// Revision parameters that cannot be resolved
    #[error("Invalid revision specification: {0}")]
    InvalidRevisionSpec(String),

    /// Malformed query parameter
    #[error("Invalid query parameter: {0}")]
    InvalidQueryParam(String),

    /// Query text that fails to compile or evaluate
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Database, resource, revision or node does not exist
    #[error("{0}")]
    NotFound(String),

    // ==================
    // Auth Errors
    // ==================
    /// Authentication error
    #[error("{0}")]
    Auth(#[from] AuthError),

    // ==================
    // Server Errors (5xx)
    // ==================
    /// Storage or runtime failure
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RestError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            RestError::InvalidRevisionSpec(_) => StatusCode::BAD_REQUEST,
            RestError::InvalidQueryParam(_) => StatusCode::BAD_REQUEST,
            RestError::InvalidQuery(_) => StatusCode::BAD_REQUEST,

            // 401 from auth
            RestError::Auth(auth_err) => {
                StatusCode::from_u16(auth_err.status_code()).unwrap_or(StatusCode::UNAUTHORIZED)
            }

            // 404 Not Found
            RestError::NotFound(_) => StatusCode::NOT_FOUND,

            // 500 Internal Server Error
            RestError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text sent to the client
    pub fn body(&self) -> String {
        if self.status_code().is_server_error() {
            INTERNAL_ERROR_BODY.to_string()
        } else {
            self.to_string()
        }
    }
}

impl From<StoreError> for RestError {
    fn from(err: StoreError) -> Self {
        if err.is_usage_error() {
            RestError::NotFound(err.to_string())
        } else {
            RestError::Internal(err.to_string())
        }
    }
}

impl From<QueryError> for RestError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::Store(store_err) => RestError::from(store_err),
            other => RestError::InvalidQuery(other.to_string()),
        }
    }
}

impl From<SerializeError> for RestError {
    fn from(err: SerializeError) -> Self {
        match err {
            SerializeError::NodeNotFound(_) => RestError::NotFound(err.to_string()),
            SerializeError::Store(store_err) => RestError::from(store_err),
            SerializeError::Io(io_err) => RestError::Internal(io_err.to_string()),
        }
    }
}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "REQUEST_FAILED");
        }
        (
            status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.body(),
        )
            .into_response()
    }
}
