use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::StatusCode;

use crate::error::ScanError;
use crate::models::ImageUpload;

use super::AppState;

/// Multipart field carrying the image.
pub const IMAGE_FIELD: &str = "image";

/// The `image` part of a multipart upload, `None` when the form lacks it.
///
/// Other parts are skipped. When several `image` parts are sent the first
/// one wins.
#[derive(Debug)]
pub struct ImageForm(pub Option<ImageUpload>);

impl FromRequest<AppState> for ImageForm {
    type Rejection = ScanError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let limit = state.config.upload.max_bytes;
        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(map_multipart_rejection)?;

        let mut image = None;
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| map_multipart_error(e, limit))?
        {
            if image.is_some() || field.name() != Some(IMAGE_FIELD) {
                continue;
            }

            let filename = field.file_name().map(str::to_string);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| map_multipart_error(e, limit))?;

            image = Some(ImageUpload {
                filename,
                bytes: bytes.to_vec(),
            });
        }

        Ok(ImageForm(image))
    }
}

fn map_multipart_rejection(rejection: MultipartRejection) -> ScanError {
    ScanError::Validation(format!(
        "Expected a multipart/form-data body: {}",
        rejection.body_text()
    ))
}

fn map_multipart_error(err: MultipartError, limit: usize) -> ScanError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ScanError::PayloadTooLarge { limit }
    } else {
        ScanError::Validation(format!("Malformed multipart body: {}", err.body_text()))
    }
}
