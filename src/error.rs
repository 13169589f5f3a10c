//! Error types for the response cache
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache engine and its HTTP surface.
///
/// None of these escape `CacheStore::get`/`CacheStore::set`; the engine logs
/// them and reports absence instead.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key not found in cache (HTTP surface only)
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Configuration update would break a budget invariant
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Value too large to be admitted
    #[error("Value too large: {size_bytes} bytes exceeds limit of {limit_bytes} bytes")]
    OversizeValue { size_bytes: u64, limit_bytes: u64 },

    /// Value could not be serialized for sizing or storage
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Snapshot could not be read or parsed
    #[error("Snapshot read failed: {0}")]
    PersistenceRead(String),

    /// Snapshot could not be written
    #[error("Snapshot write failed: {0}")]
    PersistenceWrite(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) | CacheError::InvalidConfig(_) => StatusCode::BAD_REQUEST,
            CacheError::OversizeValue { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            CacheError::Serialization(_)
            | CacheError::PersistenceRead(_)
            | CacheError::PersistenceWrite(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache engine.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        let cases = vec![
            (CacheError::NotFound("k".into()), StatusCode::NOT_FOUND),
            (CacheError::InvalidRequest("bad".into()), StatusCode::BAD_REQUEST),
            (CacheError::InvalidConfig("bad".into()), StatusCode::BAD_REQUEST),
            (
                CacheError::OversizeValue {
                    size_bytes: 10,
                    limit_bytes: 1,
                },
                StatusCode::PAYLOAD_TOO_LARGE,
            ),
            (
                CacheError::PersistenceWrite("disk full".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }

    #[test]
    fn test_oversize_message_names_both_sizes() {
        let err = CacheError::OversizeValue {
            size_bytes: 2048,
            limit_bytes: 1024,
        };
        let msg = err.to_string();
        assert!(msg.contains("2048"));
        assert!(msg.contains("1024"));
    }
}
