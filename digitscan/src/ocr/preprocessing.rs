use crate::error::{Result, ScanError};
use image::{DynamicImage, GenericImageView, GrayImage, ImageFormat, ImageReader, Luma};

/// Luminance above this value becomes white, everything else black.
pub const BINARIZE_THRESHOLD: u8 = 180;

const WHITE: u8 = 255;
const BLACK: u8 = 0;

/// A single-channel image whose pixels are only ever black (0) or white (255).
///
/// Stored as 8-bit luma so it can be encoded losslessly for the OCR engine,
/// but it carries one bit of information per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryImage(GrayImage);

impl BinaryImage {
    pub fn width(&self) -> u32 {
        self.0.width()
    }

    pub fn height(&self) -> u32 {
        self.0.height()
    }

    pub fn as_gray(&self) -> &GrayImage {
        &self.0
    }

    /// Encode as PNG, the format piped to the OCR engine.
    pub fn to_png(&self) -> image::ImageResult<Vec<u8>> {
        let mut output = Vec::new();
        self.0
            .write_to(&mut std::io::Cursor::new(&mut output), ImageFormat::Png)?;
        Ok(output)
    }
}

/// Decode stored image bytes, guessing the format from its contents.
///
/// Images wider or taller than `max_dimension` are rejected before any
/// further processing.
pub fn decode_image(bytes: &[u8], max_dimension: u32) -> Result<DynamicImage> {
    let reader = ImageReader::new(std::io::Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ScanError::Ocr(format!("Failed to read image: {e}")))?;

    let img = reader
        .decode()
        .map_err(|e| ScanError::Ocr(format!("Failed to decode image: {e}")))?;

    let (width, height) = img.dimensions();
    if width > max_dimension || height > max_dimension {
        return Err(ScanError::Ocr(format!(
            "Image too large: {}x{}, maximum {}x{}",
            width, height, max_dimension, max_dimension
        )));
    }

    Ok(img)
}

/// Turn an arbitrary image into a black/white image tuned for digit recognition.
///
/// 1. Converts to grayscale
/// 2. Stretches the histogram over the full 0..=255 range
/// 3. Thresholds at [`BINARIZE_THRESHOLD`]
///
/// The cutoff is fixed. Images whose foreground and background do not
/// straddle it after stretching binarize poorly.
pub fn prepare_for_digits(img: &DynamicImage) -> BinaryImage {
    let gray = img.to_luma8();
    let stretched = autocontrast(gray);
    binarize(&stretched, BINARIZE_THRESHOLD)
}

/// Decode and prepare in one step.
pub fn preprocess_for_digits(bytes: &[u8], max_dimension: u32) -> Result<BinaryImage> {
    let img = decode_image(bytes, max_dimension)?;
    Ok(prepare_for_digits(&img))
}

/// Maps the darkest pixel to 0 and the lightest to 255,
/// scaling all intermediate values linearly
fn autocontrast(gray: GrayImage) -> GrayImage {
    let mut min_val = u8::MAX;
    let mut max_val = u8::MIN;

    for pixel in gray.pixels() {
        min_val = min_val.min(pixel[0]);
        max_val = max_val.max(pixel[0]);
    }

    // Flat image, nothing to stretch
    if max_val <= min_val {
        return gray;
    }

    let low = u32::from(min_val);
    let range = u32::from(max_val - min_val);
    let mut lut = [0u8; 256];
    for (value, slot) in lut.iter_mut().enumerate() {
        let shifted = (value as u32).saturating_sub(low).min(range);
        *slot = (shifted * 255 / range) as u8;
    }

    let mut out = gray;
    for pixel in out.pixels_mut() {
        pixel[0] = lut[pixel[0] as usize];
    }
    out
}

fn binarize(gray: &GrayImage, threshold: u8) -> BinaryImage {
    let bw = GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        if gray.get_pixel(x, y)[0] > threshold {
            Luma([WHITE])
        } else {
            Luma([BLACK])
        }
    });
    BinaryImage(bw)
}
