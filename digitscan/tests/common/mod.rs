// Shared helpers for the HTTP integration tests
#![allow(dead_code)]

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Once;

use axum::body::Body;
use axum::http::{header, Request, Response};
use axum::Router;
use image::{DynamicImage, GrayImage, ImageFormat, Luma};
use tempfile::TempDir;

use digitscan::api::{create_router, AppState};
use digitscan::config::{Config, OcrConfig, ServerConfig, StorageConfig, UploadConfig};
use digitscan::ocr::OcrProvider;
use digitscan::storage::ImageStore;

pub const BOUNDARY: &str = "digitscan-test-boundary";

static INIT: Once = Once::new();

/// Initialize tracing subscriber once for tests
pub fn init_test_logger() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    });
}

/// A router over a throwaway upload directory.
pub struct TestApp {
    pub router: Router,
    pub root: PathBuf,
    // Keeps the directory alive for the duration of the test
    _dir: TempDir,
}

impl TestApp {
    /// App whose engine path points at nothing.
    pub async fn without_engine() -> Self {
        Self::build(PathBuf::from("/nonexistent/bin/tesseract"), None).await
    }

    /// App whose engine is a shell script with `body`.
    #[cfg(unix)]
    pub async fn with_script(body: &str) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let engine = write_engine(dir.path(), body);
        Self::build_in(dir, engine, None).await
    }

    pub async fn with_limit(engine: PathBuf, max_bytes: usize) -> Self {
        Self::build(engine, Some(max_bytes)).await
    }

    pub async fn with_engine(engine: PathBuf) -> Self {
        Self::build(engine, None).await
    }

    async fn build(engine: PathBuf, max_bytes: Option<usize>) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        Self::build_in(dir, engine, max_bytes).await
    }

    async fn build_in(dir: TempDir, engine: PathBuf, max_bytes: Option<usize>) -> Self {
        init_test_logger();

        let root = dir.path().join("uploads");
        let config = Config {
            server: ServerConfig::default(),
            storage: StorageConfig { root: root.clone() },
            upload: UploadConfig {
                max_bytes: max_bytes.unwrap_or(UploadConfig::default().max_bytes),
                ..UploadConfig::default()
            },
            ocr: OcrConfig {
                engine_path: engine,
                timeout_secs: 10,
                ..OcrConfig::default()
            },
        };

        let store = ImageStore::new(&config.storage.root)
            .await
            .expect("storage root");
        let ocr = OcrProvider::new(&config.ocr);
        let router = create_router(AppState::new(config, store, ocr));

        Self {
            router,
            root,
            _dir: dir,
        }
    }

    /// Names of every file in the upload directory.
    pub fn stored_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(&self.root)
            .expect("read upload dir")
            .map(|entry| entry.expect("dir entry").file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

/// Write an executable `#!/bin/sh` stand-in for the OCR engine.
#[cfg(unix)]
pub fn write_engine(dir: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("fake-tesseract");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write engine script");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
        .expect("chmod engine script");
    path
}

/// A script that answers `--version` and otherwise prints `digits`.
pub fn engine_printing(digits: &str) -> String {
    format!(
        r#"case "$1" in
  --version) echo "tesseract 5.3.0"; exit 0 ;;
esac
cat > /dev/null
echo {digits}"#
    )
}

/// One multipart part.
pub struct Part<'a> {
    pub name: &'a str,
    pub filename: Option<&'a str>,
    pub bytes: &'a [u8],
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part.filename {
            Some(filename) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{filename}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n",
                    part.name
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                    part.name
                )
                .as_bytes(),
            ),
        }
        body.extend_from_slice(part.bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// `POST {uri}` with a multipart body and its `Content-Length`.
pub fn upload_request(uri: &str, parts: &[Part<'_>]) -> Request<Body> {
    let body = multipart_body(parts);
    Request::post(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header(header::CONTENT_LENGTH, body.len())
        .body(Body::from(body))
        .expect("request")
}

/// Shorthand for a request with a single `image` file part.
pub fn image_upload(filename: &str, bytes: &[u8]) -> Request<Body> {
    upload_request(
        "/upload",
        &[Part {
            name: "image",
            filename: Some(filename),
            bytes,
        }],
    )
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body")
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).expect("json body")
}

pub fn encode(img: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut output = Vec::new();
    img.write_to(&mut Cursor::new(&mut output), format)
        .expect("encode image");
    output
}

/// A small grey PNG.
pub fn png_fixture() -> Vec<u8> {
    encode(
        &DynamicImage::ImageLuma8(GrayImage::from_pixel(48, 24, Luma([200]))),
        ImageFormat::Png,
    )
}

const GLYPH_WIDTH: u32 = 5;
const GLYPH_HEIGHT: u32 = 7;

const GLYPHS: [[&str; 7]; 10] = [
    [" ### ", "#   #", "#  ##", "# # #", "##  #", "#   #", " ### "],
    ["  #  ", " ##  ", "  #  ", "  #  ", "  #  ", "  #  ", " ### "],
    [" ### ", "#   #", "    #", "   # ", "  #  ", " #   ", "#####"],
    ["#####", "   # ", "  #  ", "   # ", "    #", "#   #", " ### "],
    ["   # ", "  ## ", " # # ", "#  # ", "#####", "   # ", "   # "],
    ["#####", "#    ", "#### ", "    #", "    #", "#   #", " ### "],
    ["  ## ", " #   ", "#    ", "#### ", "#   #", "#   #", " ### "],
    ["#####", "    #", "   # ", "  #  ", " #   ", " #   ", " #   "],
    [" ### ", "#   #", "#   #", " ### ", "#   #", "#   #", " ### "],
    [" ### ", "#   #", "#   #", " ####", "    #", "   # ", " ##  "],
];

/// Render `digits` as dark grey blocky numerals on a light background,
/// large enough for a real engine to read.
pub fn digits_image(digits: &str) -> DynamicImage {
    let scale = 12;
    let margin = 40;
    let gap = 2 * scale;
    let count = digits.chars().count() as u32;

    let width = 2 * margin + count * GLYPH_WIDTH * scale + count.saturating_sub(1) * gap;
    let height = 2 * margin + GLYPH_HEIGHT * scale;
    let mut img = GrayImage::from_pixel(width, height, Luma([230]));

    for (i, digit) in digits.chars().enumerate() {
        let glyph = &GLYPHS[digit.to_digit(10).expect("digit") as usize];
        let left = margin + i as u32 * (GLYPH_WIDTH * scale + gap);
        for (row, line) in glyph.iter().enumerate() {
            for (col, cell) in line.chars().enumerate() {
                if cell != '#' {
                    continue;
                }
                for dy in 0..scale {
                    for dx in 0..scale {
                        img.put_pixel(
                            left + col as u32 * scale + dx,
                            margin + row as u32 * scale + dy,
                            Luma([40]),
                        );
                    }
                }
            }
        }
    }

    DynamicImage::ImageLuma8(img)
}
