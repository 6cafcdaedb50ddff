//! digitscan: an HTTP service that stores uploaded images and reads the
//! digits printed in them with an external Tesseract binary.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod ocr;
pub mod services;
pub mod storage;
