use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::ScanResult;

pub use crate::error::ErrorBody;

/// Message returned with every successful scan.
pub const UPLOAD_SUCCESS_MESSAGE: &str = "File uploaded and processed";

/// Message attached to errors raised after the image was stored.
pub const STORED_NOT_SCANNED_MESSAGE: &str = "File uploaded but OCR did not complete";

/// Multipart form accepted by `POST /upload`. Documentation only.
#[derive(Debug, ToSchema)]
pub struct UploadForm {
    /// Image file with a jpg, jpeg, png or bmp extension.
    #[schema(value_type = String, format = Binary)]
    pub image: Vec<u8>,
}

/// Successful scan. The recognized digits appear under both `value` and
/// `ocr_result`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    pub message: String,
    /// Stored name, `<stem>_<YYYYMMDD_HHMMSS_ffffff>.<ext>`.
    pub filename: String,
    /// Retrieval path, `/uploads/{filename}`.
    pub path: String,
    pub value: String,
    pub ocr_result: String,
}

impl From<ScanResult> for UploadResponse {
    fn from(result: ScanResult) -> Self {
        Self {
            message: UPLOAD_SUCCESS_MESSAGE.to_string(),
            path: result.image.url_path(),
            filename: result.image.filename,
            value: result.text.clone(),
            ocr_result: result.text,
        }
    }
}

/// Liveness acknowledgement.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AckResponse {
    pub ok: bool,
    pub msg: String,
}

impl AckResponse {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            ok: true,
            msg: msg.into(),
        }
    }
}
