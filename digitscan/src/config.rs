use serde::Deserialize;
use std::env;
use std::path::PathBuf;

pub const DEFAULT_ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp"];

/// 10 MiB
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

fn parse_env_or<T: std::str::FromStr>(var: &str, default: T) -> T
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Using default.", val, var, e);
                default
            }
        },
        Err(_) => default,
    }
}

/// Parse `ALLOWED_EXTENSIONS`.
/// Format: comma-separated extensions, with or without a leading dot, e.g. `jpg,.png,BMP`.
/// Duplicates are dropped, first occurrence wins.
fn parse_extensions(raw: &str) -> Vec<String> {
    let mut extensions: Vec<String> = Vec::new();
    for ext in raw
        .split(',')
        .map(|ext| ext.trim().trim_start_matches('.').to_lowercase())
        .filter(|ext| !ext.is_empty())
    {
        if !extensions.contains(&ext) {
            extensions.push(ext);
        }
    }
    extensions
}

fn default_extensions() -> Vec<String> {
    DEFAULT_ALLOWED_EXTENSIONS
        .iter()
        .map(|ext| ext.to_string())
        .collect()
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub upload: UploadConfig,
    pub ocr: OcrConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory uploads are written to. Created at startup when missing.
    pub root: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// Maximum request body size in bytes.
    pub max_bytes: usize,
    /// Lowercase extensions without the leading dot.
    pub allowed_extensions: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OcrConfig {
    /// Tesseract executable, either a bare name resolved through `PATH` or a full path.
    pub engine_path: PathBuf,
    pub languages: String,
    pub timeout_secs: u64,
    pub max_image_dimension: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            allowed_extensions: default_extensions(),
        }
    }
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            engine_path: PathBuf::from("tesseract"),
            languages: "eng".to_string(),
            timeout_secs: 30,
            max_image_dimension: 8192,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: env::var("DIGITSCAN_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_env_or("DIGITSCAN_PORT", 5000),
            },
            storage: StorageConfig {
                root: env::var("UPLOAD_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from("uploads")),
            },
            upload: UploadConfig {
                max_bytes: parse_env_or("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES),
                allowed_extensions: env::var("ALLOWED_EXTENSIONS")
                    .map(|raw| parse_extensions(&raw))
                    .unwrap_or_else(|_| default_extensions()),
            },
            ocr: OcrConfig {
                engine_path: env::var("TESSERACT_CMD")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from("tesseract")),
                languages: env::var("OCR_LANGUAGES").unwrap_or_else(|_| "eng".to_string()),
                timeout_secs: parse_env_or("OCR_TIMEOUT", 30),
                max_image_dimension: parse_env_or("OCR_MAX_DIMENSION", 8192),
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Reject settings the service cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.upload.max_bytes == 0 {
            anyhow::bail!("MAX_UPLOAD_BYTES must be greater than zero");
        }
        if self.upload.allowed_extensions.is_empty() {
            anyhow::bail!("ALLOWED_EXTENSIONS must name at least one extension");
        }
        if self.ocr.engine_path.as_os_str().is_empty() {
            anyhow::bail!("TESSERACT_CMD must not be empty");
        }
        if self.ocr.timeout_secs == 0 {
            anyhow::bail!("OCR_TIMEOUT must be at least one second");
        }
        if self.ocr.languages.trim().is_empty() {
            anyhow::bail!("OCR_LANGUAGES must not be empty");
        }
        Ok(())
    }
}
