/// Unified error types for the Stratify backend
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the service
#[derive(Error, Debug)]
pub enum ApiError {
    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Authentication errors (missing/expired/invalid credential)
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Validation errors (malformed or out-of-bounds input)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Resource absent or not owned by the caller. The two cases produce
    /// the same response so existence is never leaked.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Conflict errors (e.g. duplicate email)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Per-period generation quota exhausted
    #[error("Generation quota exceeded")]
    QuotaExceeded,

    /// Webhook authenticity failure, rejected before any mutation
    #[error("Signature verification failed: {0}")]
    Signature(String),

    /// A required external collaborator is not configured or not reachable
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Volatile counter/cache store errors. Usually recovered locally
    /// (fail-open, fail-soft); reaching a response means a caller explicitly
    /// chose to surface it.
    #[error("Cache store error: {0}")]
    CacheStore(String),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Convert ApiError to HTTP response
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::Authentication(_) => (
                StatusCode::UNAUTHORIZED,
                "AuthenticationRequired",
                self.to_string(),
            ),
            ApiError::Validation(_) => (
                StatusCode::BAD_REQUEST,
                "InvalidRequest",
                self.to_string(),
            ),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NotFound", self.to_string()),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "Conflict", self.to_string()),
            ApiError::QuotaExceeded => (
                StatusCode::TOO_MANY_REQUESTS,
                "QuotaExceeded",
                "Generation quota exceeded for the current period".to_string(),
            ),
            ApiError::Signature(_) => (
                StatusCode::BAD_REQUEST,
                "InvalidSignature",
                self.to_string(),
            ),
            ApiError::ServiceUnavailable(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "ServiceUnavailable",
                self.to_string(),
            ),
            ApiError::Database(_) | ApiError::CacheStore(_) | ApiError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "InternalServerError",
                "Internal server error".to_string(), // Don't leak details
            ),
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for service operations
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_error_maps_to_429() {
        let response = ApiError::QuotaExceeded.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn test_not_found_maps_to_404() {
        let response = ApiError::NotFound("strategy".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_internal_errors_do_not_leak_details() {
        let err = ApiError::Internal("redis password in connection string".to_string());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_signature_error_maps_to_400() {
        let response = ApiError::Signature("digest mismatch".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
