use axum::{
    extract::{rejection::PathRejection, Path, State},
    http::header,
    response::{IntoResponse, Response},
};

use crate::api::dto::ErrorBody;
use crate::api::AppState;
use crate::error::{Result, ScanError};

/// `GET /uploads/{filename}`
///
/// Serves a stored upload. Names that would resolve outside the upload
/// directory are reported as not found.
#[utoipa::path(
    get,
    path = "/uploads/{filename}",
    tag = "upload",
    params(("filename" = String, Path, description = "Stored filename")),
    responses(
        (status = 200, description = "Stored image bytes", body = Vec<u8>, content_type = "application/octet-stream"),
        (status = 404, description = "No such stored file", body = ErrorBody),
    )
)]
pub async fn get_upload(
    State(state): State<AppState>,
    filename: std::result::Result<Path<String>, PathRejection>,
) -> Result<Response> {
    let Path(filename) =
        filename.map_err(|e| ScanError::NotFound(format!("Invalid file path: {}", e.body_text())))?;

    let file = state.store.retrieve(&filename).await?;
    Ok(([(header::CONTENT_TYPE, file.content_type)], file.bytes).into_response())
}
