//! Error types for the cache layer and the HTTP API
//!
//! Provides unified error handling using thiserror.

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Failure reported by a single cache tier.
///
/// These never reach API callers: the two-tier store absorbs them and turns
/// them into misses or `false` outcomes.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Redis rejected the command or the connection broke
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Value could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Tier did not answer within its deadline
    #[error("Cache operation timed out after {0:?}")]
    Timeout(Duration),

    /// Tier is not configured or cannot be reached
    #[error("Cache tier unavailable: {0}")]
    Unavailable(String),

    /// Tier lacks the requested capability
    #[error("Unsupported cache operation: {0}")]
    Unsupported(String),
}

/// Result type returned by cache tiers.
pub type CacheResult<T> = std::result::Result<T, CacheError>;

// == API Error Enum ==
/// Error type surfaced by the catalog service and HTTP handlers.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Requested entity does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the catalog service and API.
pub type Result<T> = std::result::Result<T, ApiError>;
