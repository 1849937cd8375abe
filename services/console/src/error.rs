//! services/console/src/error.rs
//!
//! Defines the error types for the console service: `ApiError` for startup
//! and `WebError` for handler responses.

use crate::config::ConfigError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use swim_admin_core::error::FormError;
use swim_admin_core::ports::PortError;
use swim_admin_core::validation::ValidationError;

/// The primary error type for the `console` binary.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// The upstream HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

//=========================================================================================
// Handler Errors
//=========================================================================================

/// Errors returned from route handlers, rendered as `{ "error", "code" }` JSON.
#[derive(Debug, thiserror::Error)]
pub enum WebError {
    #[error(transparent)]
    Port(#[from] PortError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

pub type WebResult<T> = Result<T, WebError>;

impl From<FormError> for WebError {
    fn from(err: FormError) -> Self {
        match err {
            FormError::Validation(e) => WebError::Validation(e),
            FormError::Port(e) => WebError::Port(e),
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            WebError::Port(port) => match port {
                PortError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
                PortError::Unauthorized => (
                    StatusCode::UNAUTHORIZED,
                    "UPSTREAM_UNAUTHORIZED",
                    "The upstream API rejected the console's credentials".to_string(),
                ),
                PortError::Cancelled => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "CANCELLED",
                    "The request was cancelled".to_string(),
                ),
                PortError::Unexpected(msg) => {
                    tracing::error!(error = %msg, "Upstream API error");
                    (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", msg.clone())
                }
            },
            WebError::Validation(e) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "VALIDATION_ERROR",
                e.to_string(),
            ),
            WebError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}
