use axum::{
    body::Body,
    extract::State,
    http::{header::CONTENT_LENGTH, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::api::state::AppState;
use crate::error::ScanError;

/// Reject uploads whose declared `Content-Length` exceeds the configured
/// maximum before any of the body is read.
///
/// Bodies without a length (chunked) pass through and are cut off by the
/// router's body limit while streaming.
pub async fn enforce_content_length(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let limit = state.config.upload.max_bytes;
    let declared = request
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());

    match declared {
        Some(length) if length > limit as u64 => {
            warn!(content_length = length, limit, "Rejected oversized upload");
            ScanError::PayloadTooLarge { limit }.into_response()
        }
        _ => next.run(request).await,
    }
}
