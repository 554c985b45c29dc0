//! Error responses for all endpoints.
//!
//! Every failure is rendered as `{ "error": { "code": "...", "message": "..." } }`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::error::MonitorError;
use crate::storage::StorageError;

/// Error detail inside [`ErrorBody`].
#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Handler error, mapped to a status code at the response boundary.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed request. 400.
    #[error("{0}")]
    Validation(String),
    /// Observation log failure. 500.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "BAD_REQUEST",
            ApiError::Storage(StorageError::Timeout(_)) => "STORAGE_TIMEOUT",
            ApiError::Storage(_) => "STORAGE_ERROR",
        }
    }
}

impl From<MonitorError> for ApiError {
    fn from(err: MonitorError) -> Self {
        match err {
            MonitorError::Validation(msg) => ApiError::Validation(msg),
            MonitorError::Storage(e) => ApiError::Storage(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, "Rejected request");
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code(),
                message: self.to_string(),
            },
        };
        (status, axum::Json(body)).into_response()
    }
}
