//! Maps domain errors onto HTTP responses with a uniform JSON body.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use taskboard_core::CoreError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Resource not found: {0}")]
    NotFound(&'static str),

    #[error("Invalid request body: {0}")]
    BadBody(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadBody(rejection.body_text())
    }
}

impl From<taskboard_core::AuthError> for ApiError {
    fn from(err: taskboard_core::AuthError) -> Self {
        ApiError::Core(err.into())
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            ApiError::NotFound(what) => {
                (StatusCode::NOT_FOUND, "not_found", Some(format!("{what} not found")))
            }
            ApiError::BadBody(msg) => (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone())),
            ApiError::Core(err) => match err {
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
                }
                CoreError::NotFound(what) => {
                    (StatusCode::NOT_FOUND, "not_found", Some(format!("{what} not found")))
                }
                CoreError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", Some(msg.clone())),
                CoreError::Auth(reason) => {
                    // Which check failed stays server-side.
                    tracing::debug!(%reason, "Request unauthorized");
                    (StatusCode::UNAUTHORIZED, "unauthorized", None)
                }
                CoreError::Storage(e) => {
                    tracing::error!(error = %e, "Database error");
                    (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
                }
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal server error");
                    (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
                }
            },
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, ApiError>;
