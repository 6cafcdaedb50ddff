use axum::{extract::State, Json};
use serde::Serialize;

use crate::api::dto::AckResponse;
use crate::api::AppState;

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct HealthData {
    /// `ok`, or `degraded` when either dependency is unusable.
    pub status: String,
    pub version: String,
    pub storage: StorageStatus,
    pub ocr: OcrStatus,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct StorageStatus {
    pub status: String,
    pub root: String,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct OcrStatus {
    pub status: String,
    pub engine: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// `GET /`
#[utoipa::path(
    get,
    path = "/",
    tag = "health",
    responses((status = 200, description = "Service is up", body = AckResponse))
)]
pub async fn root() -> Json<AckResponse> {
    Json(AckResponse::new("digitscan alive."))
}

/// `POST /ping`
#[utoipa::path(
    post,
    path = "/ping",
    tag = "health",
    responses((status = 200, description = "Pong", body = AckResponse))
)]
pub async fn ping() -> Json<AckResponse> {
    Json(AckResponse::new("ping"))
}

/// `GET /health`
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Storage and OCR engine status", body = HealthData),
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthData> {
    let root = state.store.root();
    let storage_status = match tokio::fs::metadata(root).await {
        Ok(meta) if meta.is_dir() => "ok",
        _ => "error",
    };

    let ocr = match state.ocr.probe().await {
        Ok(version) => OcrStatus {
            status: "ok".to_string(),
            engine: state.ocr.engine_path().display().to_string(),
            version: Some(version),
        },
        Err(e) => {
            tracing::warn!(error = %e, "OCR engine probe failed");
            OcrStatus {
                status: "unavailable".to_string(),
                engine: state.ocr.engine_path().display().to_string(),
                version: None,
            }
        }
    };

    let status = if storage_status == "ok" && ocr.status == "ok" {
        "ok"
    } else {
        "degraded"
    };

    Json(HealthData {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        storage: StorageStatus {
            status: storage_status.to_string(),
            root: root.display().to_string(),
        },
        ocr,
    })
}
