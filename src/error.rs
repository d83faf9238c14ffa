//! Error types for the federation portal
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Maximum length for backend response bodies quoted in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

// == Backend Error Enum ==
/// Failures reported by the hosted backend (data, auth or storage).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    /// Credential missing, expired or rejected
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Table, row or object does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Backend answered with a 5xx status
    #[error("Backend server error: {0}")]
    Server(String),

    /// Any other non-success status
    #[error("Backend returned status {status}: {body}")]
    Http { status: u16, body: String },

    /// Request never completed (DNS, connect, timeout)
    #[error("Network error: {0}")]
    Network(String),

    /// Response body could not be decoded
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl BackendError {
    /// Maps a non-success HTTP status and its body to a backend error.
    pub fn from_status(status: u16, body: &str) -> Self {
        let body = truncate_body(body);
        match status {
            401 | 403 => BackendError::Unauthorized(body),
            404 => BackendError::NotFound(body),
            500..=599 => BackendError::Server(body),
            _ => BackendError::Http { status, body },
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            BackendError::InvalidResponse(err.to_string())
        } else {
            BackendError::Network(err.to_string())
        }
    }
}

fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_LENGTH {
        return body.to_string();
    }
    let mut end = MAX_ERROR_BODY_LENGTH;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
}

// == Cache Error Enum ==
/// Errors raised by cache maintenance calls.
///
/// Lookups never produce this type; they hand back the fetcher's own error.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Invalidation pattern is not a valid regular expression
    #[error("Invalid invalidation pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

// == API Error Enum ==
/// Error type returned by HTTP handlers.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Unknown content resource
    #[error("Unknown resource: {0}")]
    UnknownResource(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Sign-in rejected
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Upstream backend failure
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Cache maintenance failure
    #[error(transparent)]
    Cache(#[from] CacheError),
}

// == IntoResponse Implementation ==
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::UnknownResource(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::AuthenticationFailed(_) => StatusCode::UNAUTHORIZED,
            ApiError::Backend(BackendError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Backend(_) => StatusCode::BAD_GATEWAY,
            ApiError::Cache(CacheError::InvalidPattern(_)) => StatusCode::BAD_REQUEST,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for HTTP handlers.
pub type Result<T> = std::result::Result<T, ApiError>;
