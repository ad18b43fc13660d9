use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

pub const GENERIC_INTERNAL_DETAIL: &str = "An unexpected error occurred";

/// Errors surfaced at the HTTP boundary.
///
/// Bodies always have the shape `{"detail": "..."}`. Internal failures never
/// echo their cause to the client; the cause is logged instead.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            ApiError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::Internal(msg) => {
                tracing::error!("Unhandled exception: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    GENERIC_INTERNAL_DETAIL.to_string(),
                )
            }
        };

        let body = Json(json!({ "detail": message }));
        (status, body).into_response()
    }
}

/// Failures raised by the retrieval and generation collaborators.
#[derive(Debug, Error)]
pub enum RagError {
    #[error("Embedding error ({provider}): {message}")]
    Embedding { provider: String, message: String },

    #[error("Vector index error: {0}")]
    Index(String),

    #[error("Generation error ({provider}): {message}")]
    Generation { provider: String, message: String },

    #[error("Index I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type RagResult<T> = std::result::Result<T, RagError>;
