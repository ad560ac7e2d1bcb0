//! Response DTOs for the item store API
//!
//! Defines the structure of outgoing HTTP response bodies. Items themselves
//! are serialized directly from [`crate::store::Item`].

use serde::Serialize;

/// Response body for the index endpoint (GET /)
#[derive(Debug, Clone, Serialize)]
pub struct ServiceInfo {
    pub name: String,
    pub version: String,
    /// Where the item collection lives
    pub url: String,
}

impl ServiceInfo {
    pub fn new(base_url: &str) -> Self {
        Self {
            name: "Item Demo REST API Service".to_string(),
            version: "1.0".to_string(),
            url: format!("{}/items", base_url),
        }
    }
}

/// Response body for the health endpoint (GET /healthcheck)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// HTTP status mirrored into the body
    pub status: u16,
    pub message: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: 200,
            message: "Healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub status: u16,
    /// Reason phrase of the status code
    pub error: String,
    /// What went wrong
    pub message: String,
}

impl ErrorResponse {
    pub fn new(status: u16, error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            error: error.into(),
            message: message.into(),
        }
    }
}
