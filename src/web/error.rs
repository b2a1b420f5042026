use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

use crate::QaError;

pub type WebResult<T> = Result<T, WebError>;

#[derive(Debug, thiserror::Error)]
pub enum WebError {
    #[error(transparent)]
    Qa(#[from] QaError),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Not found")]
    NotFound,
}

impl WebError {
    /// Get HTTP status code for this error
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Qa(QaError::Embedding(_) | QaError::Generation(_)) => StatusCode::BAD_GATEWAY,
            Self::Qa(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
        }
    }

    /// Get error code string
    fn error_code(&self) -> &'static str {
        match self {
            Self::Qa(QaError::Embedding(_)) => "EMBEDDING_ERROR",
            Self::Qa(QaError::Generation(_)) => "GENERATION_ERROR",
            Self::Qa(QaError::FileNotFound { .. } | QaError::Read { .. }) => "INGEST_ERROR",
            Self::Qa(QaError::Config(_)) => "CONFIG_ERROR",
            Self::Qa(_) | Self::Internal(_) => "INTERNAL_ERROR",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::NotFound => "NOT_FOUND",
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        let body = Json(json!({
            "error": {
                "code": self.error_code(),
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

impl From<JsonRejection> for WebError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<tokio::task::JoinError> for WebError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Internal(format!("Request task failed: {err}"))
    }
}
