use axum::Json;
use utoipa::OpenApi;
use utoipa_redoc::{Redoc, Servable};

use super::dto;
use super::handlers;
use crate::error::ErrorKind;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "digitscan API",
        version = "0.1.0",
        description = "Upload images and read the digits printed in them.",
    ),
    paths(
        handlers::health::root,
        handlers::health::ping,
        handlers::health::health_check,
        handlers::upload::upload_image,
        handlers::files::get_upload,
    ),
    components(schemas(
        ErrorKind,
        dto::ErrorBody,
        dto::UploadForm,
        dto::UploadResponse,
        dto::AckResponse,
        handlers::health::HealthData,
        handlers::health::StorageStatus,
        handlers::health::OcrStatus,
    )),
    tags(
        (name = "health", description = "Liveness and dependency status"),
        (name = "upload", description = "Image upload, digit recognition and retrieval"),
    ),
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub fn redoc_router<S: Clone + Send + Sync + 'static>() -> axum::Router<S> {
    Redoc::with_url("/docs", ApiDoc::openapi()).into()
}
