use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ocr::OcrError;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Payload too large: limit is {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("OCR engine missing: {0}")]
    OcrEngineMissing(String),

    #[error("OCR error: {0}")]
    Ocr(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Machine-readable error kind, the `error` field of every error body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ValidationError,
    PayloadTooLarge,
    PersistenceError,
    OcrEngineMissing,
    OcrFailure,
    NotFound,
    MethodNotAllowed,
    InternalError,
}

impl ErrorKind {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::ValidationError => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::PersistenceError
            | Self::OcrEngineMissing
            | Self::OcrFailure
            | Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ScanError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ScanError::Validation(_) => ErrorKind::ValidationError,
            ScanError::PayloadTooLarge { .. } => ErrorKind::PayloadTooLarge,
            ScanError::Persistence(_) => ErrorKind::PersistenceError,
            ScanError::OcrEngineMissing(_) => ErrorKind::OcrEngineMissing,
            ScanError::Ocr(_) => ErrorKind::OcrFailure,
            ScanError::NotFound(_) => ErrorKind::NotFound,
            ScanError::MethodNotAllowed(_) => ErrorKind::MethodNotAllowed,
            ScanError::Internal(_) => ErrorKind::InternalError,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.kind().status()
    }

    /// Client-facing description. Internal details are logged, never returned.
    pub fn description(&self) -> String {
        match self {
            ScanError::Validation(msg)
            | ScanError::Persistence(msg)
            | ScanError::OcrEngineMissing(msg)
            | ScanError::Ocr(msg)
            | ScanError::NotFound(msg)
            | ScanError::MethodNotAllowed(msg) => msg.clone(),
            ScanError::PayloadTooLarge { limit } => {
                format!("The uploaded payload exceeds the {limit} byte limit")
            }
            ScanError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error mapped to response");
                "An internal error occurred".to_string()
            }
        }
    }
}

impl From<OcrError> for ScanError {
    fn from(err: OcrError) -> Self {
        match err {
            OcrError::EngineMissing { .. } => ScanError::OcrEngineMissing(err.to_string()),
            OcrError::Failed(_) | OcrError::TimedOut { .. } => ScanError::Ocr(err.to_string()),
        }
    }
}

/// JSON body of every error response.
///
/// The trailing optional fields are only present when an upload was stored
/// before the failure.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ErrorBody {
    pub error: ErrorKind,
    pub code: u16,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// Retrieval path, `/uploads/{filename}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Absolute location on the server's disk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stored_path: Option<String>,
}

impl From<&ScanError> for ErrorBody {
    fn from(err: &ScanError) -> Self {
        Self {
            error: err.kind(),
            code: err.status().as_u16(),
            description: err.description(),
            message: None,
            filename: None,
            path: None,
            stored_path: None,
        }
    }
}

impl IntoResponse for ScanError {
    fn into_response(self) -> Response {
        (self.status(), Json(ErrorBody::from(&self))).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;
