//! Error types for the API server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use database::{DatabaseError, ValidationError};
use pipeline::PipelineError;
use thiserror::Error;

/// Errors that can occur while serving a request.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Event could not be built or published.
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Input rejected before reaching the store.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Malformed request.
    #[error("{0}")]
    BadRequest(String),

    /// Missing or unknown organization.
    #[error("Unauthorized")]
    Unauthorized,
}

impl ApiError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            ApiError::Database(err) => status_for_database(err),
            ApiError::Pipeline(err) => match err {
                PipelineError::UnknownEvent(_) | PipelineError::Payload(_) => {
                    (StatusCode::BAD_REQUEST, err.to_string())
                }
                PipelineError::Database(inner) => status_for_database(inner),
                _ => {
                    tracing::error!("Pipeline error: {}", err);
                    internal()
                }
            },
            ApiError::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Unauthorized => {
                tracing::warn!("Unauthorized request");
                (StatusCode::UNAUTHORIZED, "Unauthorized".to_string())
            }
        }
    }
}

fn status_for_database(err: &DatabaseError) -> (StatusCode, String) {
    match err {
        DatabaseError::NotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
        DatabaseError::Validation(inner) => (StatusCode::BAD_REQUEST, inner.to_string()),
        DatabaseError::InvalidTransition { .. } | DatabaseError::AlreadyExists { .. } => {
            (StatusCode::CONFLICT, err.to_string())
        }
        _ => {
            tracing::error!("Database error: {}", err);
            internal()
        }
    }
}

fn internal() -> (StatusCode, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        let body = serde_json::json!({
            "error": message
        });

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers.
pub type Result<T> = std::result::Result<T, ApiError>;
