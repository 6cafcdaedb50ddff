use std::io;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;

use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use crate::config::OcrConfig;

use super::preprocessing::BinaryImage;

/// Characters the engine is allowed to emit.
pub const DIGIT_WHITELIST: &str = "0123456789";

/// Default engine mode: LSTM when the traineddata supports it.
const ENGINE_MODE: &str = "3";

/// Assume a single uniform block of text.
const PAGE_SEG_MODE: &str = "6";

#[derive(Error, Debug)]
pub enum OcrError {
    /// The engine binary could not be started at all. A deployment problem,
    /// not a property of the image.
    #[error("OCR engine not available at '{}': {reason}", engine.display())]
    EngineMissing { engine: PathBuf, reason: String },

    #[error("OCR failed: {0}")]
    Failed(String),

    #[error("OCR timed out after {secs} seconds")]
    TimedOut { secs: u64 },
}

/// Runs the external Tesseract binary restricted to digits.
#[derive(Debug, Clone)]
pub struct OcrProvider {
    config: OcrConfig,
}

impl OcrProvider {
    pub fn new(config: &OcrConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    pub fn engine_path(&self) -> &Path {
        &self.config.engine_path
    }

    /// Command line for a digit-only recognition reading PNG from stdin.
    pub fn digit_args(&self) -> Vec<String> {
        vec![
            "stdin".to_string(),
            "stdout".to_string(),
            "-l".to_string(),
            self.config.languages.clone(),
            "--oem".to_string(),
            ENGINE_MODE.to_string(),
            "--psm".to_string(),
            PAGE_SEG_MODE.to_string(),
            "-c".to_string(),
            format!("tessedit_char_whitelist={DIGIT_WHITELIST}"),
        ]
    }

    /// Check the engine can be started and return its version line.
    pub async fn probe(&self) -> Result<String, OcrError> {
        let child = self.spawn(&["--version".to_string()])?;
        let output = self.wait_bounded(child, Vec::new()).await?;

        if !output.status.success() {
            return Err(OcrError::Failed(format!(
                "engine exited with {} while reporting its version",
                output.status
            )));
        }

        // Older releases print the banner on stderr
        let version = first_line(&output.stdout)
            .or_else(|| first_line(&output.stderr))
            .unwrap_or_else(|| "unknown".to_string());
        Ok(version)
    }

    /// Recognize the digits in a binarized image.
    ///
    /// Returns the engine's output with surrounding whitespace trimmed. Any
    /// character outside [`DIGIT_WHITELIST`] is suppressed by the engine itself.
    pub async fn recognize_digits(&self, image: &BinaryImage) -> Result<String, OcrError> {
        let png = image
            .to_png()
            .map_err(|e| OcrError::Failed(format!("Failed to encode image: {e}")))?;

        debug!(
            engine = %self.config.engine_path.display(),
            width = image.width(),
            height = image.height(),
            bytes = png.len(),
            "Running OCR engine"
        );

        let child = self.spawn(&self.digit_args())?;
        let output = self.wait_bounded(child, png).await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::Failed(format!(
                "engine exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let text = String::from_utf8(output.stdout)
            .map_err(|e| OcrError::Failed(format!("Invalid UTF-8 output: {e}")))?;

        Ok(text.trim().to_string())
    }

    fn spawn(&self, args: &[String]) -> Result<Child, OcrError> {
        Command::new(&self.config.engine_path)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| spawn_error(&self.config.engine_path, e))
    }

    /// Feed `input` to the child and collect its output, killing it when
    /// the configured timeout elapses.
    async fn wait_bounded(&self, child: Child, input: Vec<u8>) -> Result<Output, OcrError> {
        let secs = self.config.timeout_secs;
        match tokio::time::timeout(Duration::from_secs(secs), exchange(child, input)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    engine = %self.config.engine_path.display(),
                    timeout_secs = secs,
                    "OCR engine did not finish in time, killed"
                );
                Err(OcrError::TimedOut { secs })
            }
        }
    }
}

async fn exchange(mut child: Child, input: Vec<u8>) -> Result<Output, OcrError> {
    if let Some(mut stdin) = child.stdin.take() {
        if let Err(e) = stdin.write_all(&input).await {
            // An engine that bails out early closes its end; its exit status
            // and stderr below explain why.
            if e.kind() != io::ErrorKind::BrokenPipe {
                return Err(OcrError::Failed(format!("Failed to send image to engine: {e}")));
            }
        }
        // Dropping stdin signals EOF
    }

    child
        .wait_with_output()
        .await
        .map_err(|e| OcrError::Failed(format!("Failed to wait for engine: {e}")))
}

fn spawn_error(engine: &Path, err: io::Error) -> OcrError {
    match err.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => OcrError::EngineMissing {
            engine: engine.to_path_buf(),
            reason: err.to_string(),
        },
        _ => OcrError::Failed(format!("Failed to start engine: {err}")),
    }
}

fn first_line(bytes: &[u8]) -> Option<String> {
    String::from_utf8_lossy(bytes)
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, GrayImage, Luma};

    use crate::ocr::prepare_for_digits;

    fn make_config(engine: &Path, timeout_secs: u64) -> OcrConfig {
        OcrConfig {
            engine_path: engine.to_path_buf(),
            timeout_secs,
            ..OcrConfig::default()
        }
    }

    fn blank_image() -> BinaryImage {
        prepare_for_digits(&DynamicImage::ImageLuma8(GrayImage::from_pixel(
            32,
            16,
            Luma([255]),
        )))
    }

    #[cfg(unix)]
    fn write_engine(dir: &tempfile::TempDir, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.path().join("fake-tesseract");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn test_digit_args_restrict_engine_to_digits() {
        let provider = OcrProvider::new(&OcrConfig::default());
        let args = provider.digit_args();

        assert_eq!(&args[..2], &["stdin", "stdout"]);
        assert!(args.windows(2).any(|w| w == ["-l", "eng"]));
        assert!(args.windows(2).any(|w| w == ["--oem", "3"]));
        assert!(args.windows(2).any(|w| w == ["--psm", "6"]));
        assert!(args
            .windows(2)
            .any(|w| w == ["-c", "tessedit_char_whitelist=0123456789"]));
    }

    #[tokio::test]
    async fn test_missing_engine_is_reported_distinctly() {
        let provider = OcrProvider::new(&make_config(
            Path::new("/definitely/not/here/tesseract"),
            5,
        ));

        let result = provider.recognize_digits(&blank_image()).await;
        match result {
            Err(OcrError::EngineMissing { engine, .. }) => {
                assert_eq!(engine, PathBuf::from("/definitely/not/here/tesseract"));
            }
            other => panic!("Expected EngineMissing, got {other:?}"),
        }

        let probe = provider.probe().await;
        assert!(matches!(probe, Err(OcrError::EngineMissing { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_output_is_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        let engine = write_engine(&dir, "cat > /dev/null\nprintf '  12345 \\n\\n'");
        let provider = OcrProvider::new(&make_config(&engine, 5));

        let text = provider.recognize_digits(&blank_image()).await.unwrap();
        assert_eq!(text, "12345");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_engine_receives_whitelist_and_png() {
        let dir = tempfile::tempdir().unwrap();
        let engine = write_engine(
            &dir,
            r#"case "$*" in
  *tessedit_char_whitelist=0123456789*) ;;
  *) echo "missing whitelist" >&2; exit 3 ;;
esac
head -c 4 | grep -q PNG || { echo "not a png" >&2; exit 4; }
cat > /dev/null
echo 42"#,
        );
        let provider = OcrProvider::new(&make_config(&engine, 5));

        let text = provider.recognize_digits(&blank_image()).await.unwrap();
        assert_eq!(text, "42");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_engine_failure_carries_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let engine = write_engine(&dir, "cat > /dev/null\necho 'Error in pixReadMem' >&2\nexit 1");
        let provider = OcrProvider::new(&make_config(&engine, 5));

        match provider.recognize_digits(&blank_image()).await {
            Err(OcrError::Failed(msg)) => {
                assert!(msg.contains("pixReadMem"), "unexpected message: {msg}");
            }
            other => panic!("Expected Failed, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_early_exit_without_reading_stdin_is_a_failure() {
        let dir = tempfile::tempdir().unwrap();
        let engine = write_engine(&dir, "exit 2");
        let provider = OcrProvider::new(&make_config(&engine, 5));

        let result = provider.recognize_digits(&blank_image()).await;
        assert!(matches!(result, Err(OcrError::Failed(_))), "{result:?}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_hung_engine_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let engine = write_engine(&dir, "sleep 10");
        let provider = OcrProvider::new(&make_config(&engine, 1));

        let result = provider.recognize_digits(&blank_image()).await;
        assert!(matches!(result, Err(OcrError::TimedOut { secs: 1 })), "{result:?}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_probe_reports_version_line() {
        let dir = tempfile::tempdir().unwrap();
        let engine = write_engine(&dir, "echo 'tesseract 5.3.4'\necho ' leptonica-1.84.1'");
        let provider = OcrProvider::new(&make_config(&engine, 5));

        assert_eq!(provider.probe().await.unwrap(), "tesseract 5.3.4");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_executable_engine_counts_as_missing() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let engine = write_engine(&dir, "echo 1");
        std::fs::set_permissions(&engine, std::fs::Permissions::from_mode(0o644)).unwrap();
        let provider = OcrProvider::new(&make_config(&engine, 5));

        let result = provider.recognize_digits(&blank_image()).await;
        assert!(
            matches!(result, Err(OcrError::EngineMissing { .. })),
            "{result:?}"
        );
    }
}
