//! Response DTOs for the transit API
//!
//! Defines the structure of outgoing HTTP response bodies that are not
//! catalog entities.

use serde::Serialize;

/// Response body for DELETE /routes/:id and DELETE /stops/:id
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// Success message
    pub message: String,
    pub id: u64,
}

impl DeleteResponse {
    pub fn new(kind: &str, id: u64) -> Self {
        Self {
            message: format!("{} {} deleted successfully", kind, id),
            id,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
    /// Whether the primary tier can clear cached lists on writes
    pub pattern_invalidation: bool,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy(pattern_invalidation: bool) -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            pattern_invalidation,
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delete_response_serialize() {
        let resp = DeleteResponse::new("Route", 3);
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("Route 3 deleted"));
        assert!(json.contains("\"id\":3"));
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy(false);
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
        assert!(json.contains("\"pattern_invalidation\":false"));
    }

    #[test]
    fn test_error_response_serialize() {
        let resp = ErrorResponse::new("Something went wrong");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("error"));
        assert!(json.contains("Something went wrong"));
    }
}
