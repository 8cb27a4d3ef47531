// crates/server/src/error.rs
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use mediadrop_core::ExtractionError;
use serde::Serialize;
use thiserror::Error;

use crate::delivery::DeliveryError;
use crate::jobs::RegistryError;

/// Structured JSON error response for API errors
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: Some(details.into()),
        }
    }
}

/// API error types that map to HTTP status codes
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Task not ready: {0}")]
    TaskNotReady(String),

    #[error("Artifact missing: {0}")]
    ArtifactMissing(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<DeliveryError> for ApiError {
    fn from(err: DeliveryError) -> Self {
        match err {
            DeliveryError::NotReady(id) => ApiError::TaskNotReady(id),
            DeliveryError::ArtifactMissing(id) => ApiError::ArtifactMissing(id),
            io @ DeliveryError::Io { .. } => ApiError::Internal(io.to_string()),
        }
    }
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_response) = match &self {
            ApiError::TaskNotReady(id) => {
                tracing::warn!(task_id = %id, "File requested before task finished");
                (
                    StatusCode::NOT_FOUND,
                    ErrorResponse::with_details("File not ready or task not found", format!("Task ID: {}", id)),
                )
            }
            ApiError::ArtifactMissing(id) => {
                tracing::warn!(task_id = %id, "Artifact missing");
                (
                    StatusCode::NOT_FOUND,
                    ErrorResponse::with_details("File not found on server", format!("Task ID: {}", id)),
                )
            }
            ApiError::BadRequest(msg) => {
                tracing::warn!(message = %msg, "Bad request");
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse::with_details("Bad request", msg.clone()),
                )
            }
            ApiError::Extraction(err) => {
                let error_msg = match err {
                    ExtractionError::Spawn { binary, source } => {
                        tracing::error!(binary = %binary, error = %source, "Extractor could not be started");
                        "Extractor unavailable"
                    }
                    ExtractionError::Io(source) => {
                        tracing::error!(error = %source, "IO error talking to extractor");
                        "Extractor IO error"
                    }
                    ExtractionError::ToolFailed { code, message } => {
                        tracing::warn!(code = ?code, message = %message, "Extractor failed");
                        "Extraction failed"
                    }
                    ExtractionError::Parse(message) => {
                        tracing::error!(message = %message, "Unreadable extractor output");
                        "Malformed extractor output"
                    }
                };
                (
                    StatusCode::BAD_GATEWAY,
                    ErrorResponse::with_details(error_msg, err.to_string()),
                )
            }
            ApiError::Internal(msg) => {
                tracing::error!(message = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("Internal server error"),
                )
            }
        };

        (status, Json(error_response)).into_response()
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
