use chrono::Local;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{Result, ScanError};
use crate::models::{ImageUpload, ScanResult, StoredImage};
use crate::ocr::{preprocess_for_digits, OcrProvider};
use crate::storage::{allowed_file, unique_name, ImageStore};

/// An upload that did not produce a result.
///
/// `stored` is set once the image reached disk, so callers can still point
/// the client at the persisted copy.
#[derive(Debug)]
pub struct UploadFailure {
    pub error: ScanError,
    pub stored: Option<StoredImage>,
}

impl UploadFailure {
    fn after_store(error: ScanError, stored: StoredImage) -> Self {
        Self {
            error,
            stored: Some(stored),
        }
    }
}

impl From<ScanError> for UploadFailure {
    fn from(error: ScanError) -> Self {
        Self {
            error,
            stored: None,
        }
    }
}

/// Drives an upload through validation, storage, preprocessing and recognition.
#[derive(Clone)]
pub struct UploadService {
    store: ImageStore,
    ocr: OcrProvider,
    allowed_extensions: Vec<String>,
    max_image_dimension: u32,
}

impl UploadService {
    pub fn new(store: ImageStore, ocr: OcrProvider, config: &Config) -> Self {
        Self {
            store,
            ocr,
            allowed_extensions: config.upload.allowed_extensions.clone(),
            max_image_dimension: config.ocr.max_image_dimension,
        }
    }

    /// Check an upload before anything touches the disk and return its
    /// client-supplied filename.
    pub fn validate<'a>(&self, upload: Option<&'a ImageUpload>) -> Result<&'a str> {
        let upload = upload.ok_or_else(|| {
            ScanError::Validation("No file part: the 'image' field is required".to_string())
        })?;

        let filename = upload
            .filename
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| ScanError::Validation("No file selected".to_string()))?;

        if !allowed_file(filename, &self.allowed_extensions) {
            return Err(ScanError::Validation(format!(
                "File type not allowed: '{filename}'. Allowed extensions: {}",
                self.allowed_extensions.join(", ")
            )));
        }

        Ok(filename)
    }

    /// Process one upload end to end.
    ///
    /// The image is stored before recognition starts and recognition reads
    /// the stored copy back, so a failed scan still leaves the file on disk.
    pub async fn process(
        &self,
        upload: Option<ImageUpload>,
    ) -> std::result::Result<ScanResult, UploadFailure> {
        let original = self.validate(upload.as_ref())?.to_string();
        let bytes = upload.map(|u| u.bytes).unwrap_or_default();

        let created_at = Local::now();
        let filename = unique_name(&original, created_at.naive_local());
        let stored = self.store.save(&bytes, &filename, created_at).await?;

        info!(
            original = %original,
            filename = %stored.filename,
            bytes = bytes.len(),
            "Accepted upload"
        );

        match self.recognize(&stored).await {
            Ok(text) => {
                info!(filename = %stored.filename, digits = text.len(), "OCR complete");
                Ok(ScanResult {
                    image: stored,
                    text,
                })
            }
            Err(error) => {
                warn!(filename = %stored.filename, error = %error, "OCR did not complete");
                Err(UploadFailure::after_store(error, stored))
            }
        }
    }

    async fn recognize(&self, stored: &StoredImage) -> Result<String> {
        let bytes = self.store.load(stored).await?;
        let max_dimension = self.max_image_dimension;

        let binary =
            tokio::task::spawn_blocking(move || preprocess_for_digits(&bytes, max_dimension))
                .await
                .map_err(|e| ScanError::Internal(format!("Preprocessing task failed: {e}")))??;

        let text = self.ocr.recognize_digits(&binary).await?;
        Ok(text)
    }
}
