//! API error type and its JSON rendering.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::instagram::{ErrorKind, InstagramError};
use crate::relay::RelayError;
use crate::sync::SyncError;

/// Error returned by API handlers.
///
/// Upstream failures are reported generically; their detail goes to the log,
/// never into the response body.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    /// Instagram failed, rejected our credential, or the feed misbehaved.
    #[error("upstream failure: {0}")]
    Upstream(String),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Serialize)]
struct ErrorResponse {
    error: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            Self::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg),
            Self::Upstream(detail) => {
                tracing::warn!(detail = %detail, "upstream failure");
                (
                    StatusCode::BAD_GATEWAY,
                    "upstream_error",
                    "Instagram request failed".to_string(),
                )
            }
            Self::Internal(err) => {
                tracing::error!(error = %format!("{err:#}"), "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
        };

        (status, Json(ErrorResponse { error, message })).into_response()
    }
}

impl From<InstagramError> for ApiError {
    fn from(err: InstagramError) -> Self {
        match err.kind() {
            ErrorKind::NotFound => Self::NotFound("resource not found in Instagram".to_string()),
            ErrorKind::Auth | ErrorKind::Gateway => Self::Upstream(err.to_string()),
        }
    }
}

impl From<SyncError> for ApiError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::Remote(e) => e.into(),
            SyncError::PageLimitExceeded { .. } => Self::Upstream(err.to_string()),
            SyncError::AlreadyRunning(_) => Self::Conflict(err.to_string()),
            SyncError::Store(e) => Self::Internal(e),
        }
    }
}

impl From<RelayError> for ApiError {
    fn from(err: RelayError) -> Self {
        match err {
            RelayError::PostNotFound(id) => Self::NotFound(format!("post {id} not found")),
            RelayError::Remote(e) => e.into(),
            RelayError::Store(e) => Self::Internal(e),
        }
    }
}
