//! HTTP error type for the speed-camera server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use config::AccessWindow;
use engine::EngineError;
use thiserror::Error;

/// Error returned by every handler.
///
/// Rendered as:
/// ```json
/// { "status": "error", "message": "..." }
/// ```
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed request: bad JSON, bad query parameters.
    #[error("{0}")]
    BadRequest(String),

    /// Query outside the configured access window.
    #[error("queries are only served between {0}")]
    Forbidden(AccessWindow),

    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Poisoned lock or a failed blocking task.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Engine(e) if e.is_validation() => StatusCode::BAD_REQUEST,
            Self::Engine(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(%status, error = %self, "request rejected");
        }

        let body = serde_json::json!({
            "status": "error",
            "message": self.to_string()
        });

        (status, Json(body)).into_response()
    }
}

impl From<&str> for ApiError {
    fn from(msg: &str) -> Self {
        ApiError::BadRequest(msg.to_string())
    }
}
