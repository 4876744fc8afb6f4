//! Error types and error handling for the application
//!
//! This module defines the HTTP-facing error type. Module errors convert
//! into it with `?`, and every variant renders as
//! `{"error": <message>, "status": <code>}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::dashscope::{CompletionError, RecognitionError};
use crate::orchestrator::{PlanError, UploadRecognizeError};
use crate::services::{DirectoryError, PersistenceError};
use crate::storage::StorageError;

/// Application-level error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Object storage failure
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Completion endpoint failure
    #[error("Completion error: {0}")]
    Completion(#[from] CompletionError),

    /// Speech recognition failure
    #[error("Recognition error: {0}")]
    Recognition(#[from] RecognitionError),

    /// Plan generation failure
    #[error("Plan generation error: {0}")]
    Plan(#[from] PlanError),

    /// Plan persistence failure
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// Caller lookup against the user directory failed
    #[error("{0}")]
    Directory(#[from] DirectoryError),

    /// Missing or rejected caller identity
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Request body or form failed validation
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The request exceeded its overall deadline
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Internal server error (catch-all for unexpected errors)
    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<UploadRecognizeError> for AppError {
    fn from(err: UploadRecognizeError) -> Self {
        match err {
            UploadRecognizeError::Storage(e) => AppError::Storage(e),
            UploadRecognizeError::Recognition(e) => AppError::Recognition(e),
        }
    }
}

impl AppError {
    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Storage(StorageError::NotConfigured(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Storage(StorageError::UploadFailed { .. }) => StatusCode::BAD_GATEWAY,
            AppError::Completion(e) => completion_status(e),
            AppError::Recognition(e) => recognition_status(e),
            AppError::Plan(PlanError::Completion(e)) => completion_status(e),
            AppError::Plan(PlanError::MalformedResponse { .. }) => StatusCode::BAD_GATEWAY,
            AppError::Persistence(PersistenceError::NotConfigured) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Persistence(_) => StatusCode::BAD_GATEWAY,
            AppError::Directory(DirectoryError::NotConfigured) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Directory(DirectoryError::InvalidToken(_)) => StatusCode::UNAUTHORIZED,
            AppError::Directory(DirectoryError::Transport(_)) => StatusCode::BAD_GATEWAY,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn completion_status(err: &CompletionError) -> StatusCode {
    match err {
        CompletionError::Auth => StatusCode::UNAUTHORIZED,
        CompletionError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        CompletionError::Remote { .. } | CompletionError::Transport(_) => StatusCode::BAD_GATEWAY,
    }
}

fn recognition_status(err: &RecognitionError) -> StatusCode {
    match err {
        RecognitionError::Auth => StatusCode::UNAUTHORIZED,
        RecognitionError::Timeout(_) | RecognitionError::PollingTimeout { .. } => {
            StatusCode::GATEWAY_TIMEOUT
        }
        _ => StatusCode::BAD_GATEWAY,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_message = self.to_string();

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %error_message, "Request failed");
        } else {
            tracing::warn!(status = status.as_u16(), error = %error_message, "Request rejected");
        }

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}
