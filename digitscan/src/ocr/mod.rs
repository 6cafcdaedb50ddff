//! OCR (Optical Character Recognition) Module
//!
//! Reads the digits printed in an uploaded image. The work is split in two:
//!
//! - `preprocessing` turns any decodable image into a [`BinaryImage`]
//!   (grayscale, autocontrast, fixed threshold)
//! - `provider` hands that image to an external Tesseract binary configured
//!   with a `0-9` character whitelist
//!
//! # Configuration
//!
//! OCR behavior is controlled via `OcrConfig` (see `config.rs`):
//! - `engine_path`: Tesseract executable (`TESSERACT_CMD`)
//! - `languages`: traineddata passed with `-l`
//! - `timeout_secs`: upper bound for a single engine run
//! - `max_image_dimension`: size limit for decoded images
//!
//! # Usage
//!
//! ```rust,ignore
//! let ocr = OcrProvider::new(&config.ocr);
//! let binary = preprocess_for_digits(&bytes, config.ocr.max_image_dimension)?;
//! let digits = ocr.recognize_digits(&binary).await?;
//! ```

mod preprocessing;
mod provider;

pub use preprocessing::{
    decode_image, prepare_for_digits, preprocess_for_digits, BinaryImage, BINARIZE_THRESHOLD,
};
pub use provider::{OcrError, OcrProvider, DIGIT_WHITELIST};
