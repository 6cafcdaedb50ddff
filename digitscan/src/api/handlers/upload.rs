use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};

use crate::api::dto::{ErrorBody, UploadForm, UploadResponse, STORED_NOT_SCANNED_MESSAGE};
use crate::api::extractors::ImageForm;
use crate::api::AppState;
use crate::services::UploadFailure;

/// `POST /upload`
///
/// Stores the `image` part under a unique name, then reads the digits in it.
#[utoipa::path(
    post,
    path = "/upload",
    tag = "upload",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Image stored and scanned", body = UploadResponse),
        (status = 400, description = "Missing image, empty filename or disallowed extension", body = ErrorBody),
        (status = 413, description = "Request body over the upload limit", body = ErrorBody),
        (status = 500, description = "Storage or OCR failure", body = ErrorBody),
    )
)]
pub async fn upload_image(
    State(state): State<AppState>,
    ImageForm(upload): ImageForm,
) -> Result<Json<UploadResponse>, UploadFailure> {
    let result = state.uploads.process(upload).await?;
    Ok(Json(UploadResponse::from(result)))
}

impl IntoResponse for UploadFailure {
    fn into_response(self) -> Response {
        let Some(stored) = self.stored else {
            return self.error.into_response();
        };

        let status = self.error.status();
        let mut body = ErrorBody::from(&self.error);
        body.message = Some(STORED_NOT_SCANNED_MESSAGE.to_string());
        body.path = Some(stored.url_path());
        body.stored_path = Some(stored.path.display().to_string());
        body.filename = Some(stored.filename);

        (status, Json(body)).into_response()
    }
}
