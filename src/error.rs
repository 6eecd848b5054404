//! Error types for the cache engine
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Unified error type for the cache engine and its HTTP surface.
///
/// Most engine faults never reach a caller: codec failures degrade to
/// uncompressed storage or a miss, and malformed snapshots make `import`
/// return `false`. The variants below are what remains visible.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key not found in cache
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Rejected cache configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Operation attempted after `destroy()`
    #[error("Cache has been destroyed")]
    Destroyed,

    /// Compression codec failure
    #[error("Codec error: {0}")]
    Codec(String),

    /// Snapshot file access failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Value (de)serialization failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Snapshot blob could not be used
    #[error("Malformed snapshot: {0}")]
    Snapshot(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_)
            | CacheError::InvalidConfig(_)
            | CacheError::Snapshot(_) => StatusCode::BAD_REQUEST,
            CacheError::Destroyed => StatusCode::SERVICE_UNAVAILABLE,
            CacheError::Codec(_)
            | CacheError::Io(_)
            | CacheError::Serialization(_)
            | CacheError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache engine.
pub type Result<T> = std::result::Result<T, CacheError>;
