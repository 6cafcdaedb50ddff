use std::path::PathBuf;

use chrono::{DateTime, Local};
use serde::Serialize;

/// Route prefix stored images are served from.
pub const UPLOADS_ROUTE: &str = "/uploads";

/// The `image` part of an upload request, as received.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    /// Client-supplied filename. `None` when the part was not sent as a file.
    pub filename: Option<String>,
    pub bytes: Vec<u8>,
}

/// An accepted upload persisted under the storage root. Never mutated after
/// it is written.
#[derive(Debug, Clone, Serialize)]
pub struct StoredImage {
    /// Sanitized, timestamped name, unique within the storage root.
    pub filename: String,
    /// Absolute location on disk.
    pub path: PathBuf,
    pub created_at: DateTime<Local>,
}

impl StoredImage {
    /// Path a browser can fetch the image back from.
    pub fn url_path(&self) -> String {
        format!("{UPLOADS_ROUTE}/{}", self.filename)
    }
}

/// Outcome of a successful scan, scoped to a single request.
#[derive(Debug, Clone, Serialize)]
pub struct ScanResult {
    pub image: StoredImage,
    /// Whitespace-trimmed engine output, digits only.
    pub text: String,
}
