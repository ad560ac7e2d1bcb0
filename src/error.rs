//! Error types for the item store
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

use crate::models::ErrorResponse;

// == Store Error Enum ==
/// Unified error type for the item store service.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Item data failed schema validation
    #[error("{0}")]
    Validation(String),

    /// Requested item does not exist
    #[error("{0}")]
    NotFound(String),

    /// Malformed request that is not a data validation problem
    #[error("{0}")]
    BadRequest(String),

    /// Route exists but does not accept the request method
    #[error("{0}")]
    MethodNotAllowed(String),

    /// Request body has the wrong media type
    #[error("{0}")]
    UnsupportedMediaType(String),

    /// Key-value backend failed or is unreachable
    #[error("Backend error: {0}")]
    Backend(String),

    /// Stored record could not be decoded
    #[error("Corrupt record under key '{key}': {reason}")]
    Corrupt { key: String, reason: String },
}

impl StoreError {
    /// HTTP status code this error maps to.
    pub fn status_code(&self) -> StatusCode {
        match self {
            StoreError::Validation(_) | StoreError::BadRequest(_) => StatusCode::BAD_REQUEST,
            StoreError::NotFound(_) => StatusCode::NOT_FOUND,
            StoreError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            StoreError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            StoreError::Backend(_) | StoreError::Corrupt { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        StoreError::Backend(err.to_string())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        let body = Json(ErrorResponse::new(
            status.as_u16(),
            status.canonical_reason().unwrap_or("Error"),
            self.to_string(),
        ));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the item store.
pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            StoreError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            StoreError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            StoreError::MethodNotAllowed("x".into()).status_code(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(
            StoreError::UnsupportedMediaType("x".into()).status_code(),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
        assert_eq!(
            StoreError::Backend("down".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let response = StoreError::NotFound("Item with id '7' was not found.".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["status"], 404);
        assert_eq!(json["error"], "Not Found");
        assert!(json["message"].as_str().unwrap().contains("was not found"));
    }
}
