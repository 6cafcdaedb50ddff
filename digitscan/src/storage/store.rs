use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Local};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::{Result, ScanError};
use crate::models::StoredImage;

/// A stored file read back for serving.
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Filesystem storage rooted at a single directory.
///
/// Every read and write resolves inside the root; names that would escape it
/// are treated as absent.
#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    /// Open the store, creating the root directory if needed.
    pub async fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        tokio::fs::create_dir_all(root).await.map_err(|e| {
            ScanError::Persistence(format!(
                "Failed to create upload directory {}: {e}",
                root.display()
            ))
        })?;

        let root = tokio::fs::canonicalize(root).await.map_err(|e| {
            ScanError::Persistence(format!(
                "Failed to resolve upload directory {}: {e}",
                root.display()
            ))
        })?;

        info!(root = %root.display(), "Upload storage ready");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `bytes` as `filename` directly under the root.
    ///
    /// Existing files are never overwritten: a name clash is a persistence
    /// error.
    pub async fn save(
        &self,
        bytes: &[u8],
        filename: &str,
        created_at: DateTime<Local>,
    ) -> Result<StoredImage> {
        if !is_single_component(filename) {
            return Err(ScanError::Persistence(format!(
                "Refusing to store under unsafe name '{filename}'"
            )));
        }

        let path = self.root.join(filename);
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => {
                    ScanError::Persistence(format!("File {filename} already exists"))
                }
                _ => ScanError::Persistence(format!("Failed to create {filename}: {e}")),
            })?;

        file.write_all(bytes)
            .await
            .map_err(|e| ScanError::Persistence(format!("Failed to write {filename}: {e}")))?;
        file.flush()
            .await
            .map_err(|e| ScanError::Persistence(format!("Failed to write {filename}: {e}")))?;

        info!(filename = %filename, bytes = bytes.len(), "Stored upload");

        Ok(StoredImage {
            filename: filename.to_string(),
            path,
            created_at,
        })
    }

    /// Read back a file this store previously saved.
    pub async fn load(&self, image: &StoredImage) -> Result<Vec<u8>> {
        tokio::fs::read(&image.path).await.map_err(|e| {
            ScanError::Persistence(format!("Failed to read {}: {e}", image.filename))
        })
    }

    /// Serve a stored file by name, strictly from within the root.
    pub async fn retrieve(&self, filename: &str) -> Result<StoredFile> {
        let not_found = || ScanError::NotFound(format!("File {filename} not found"));

        let path = self.resolve(filename).await.ok_or_else(not_found)?;
        let bytes = tokio::fs::read(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => not_found(),
            _ => ScanError::Persistence(format!("Failed to read {filename}: {e}")),
        })?;

        let content_type = mime_guess::from_path(&path)
            .first_or_octet_stream()
            .to_string();

        Ok(StoredFile {
            bytes,
            content_type,
        })
    }

    /// Canonical path of an existing regular file under the root.
    async fn resolve(&self, filename: &str) -> Option<PathBuf> {
        if !is_relative_inside(filename) {
            debug!(filename = %filename, "Rejected unsafe retrieval path");
            return None;
        }

        let canonical = tokio::fs::canonicalize(self.root.join(filename))
            .await
            .ok()?;
        if !canonical.starts_with(&self.root) {
            debug!(filename = %filename, "Retrieval path escapes storage root");
            return None;
        }

        let metadata = tokio::fs::metadata(&canonical).await.ok()?;
        metadata.is_file().then_some(canonical)
    }
}

/// Only plain, forward-slash separated components: no root, no `..`, no drive
/// prefixes, no backslashes or NUL bytes.
fn is_relative_inside(name: &str) -> bool {
    !name.is_empty()
        && !name.contains('\\')
        && !name.contains('\0')
        && Path::new(name)
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
}

fn is_single_component(name: &str) -> bool {
    is_relative_inside(name) && !name.contains('/')
}
