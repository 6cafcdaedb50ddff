use std::any::Any;

use axum::{
    extract::DefaultBodyLimit,
    http::{Method, Uri},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any as AnyOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers;
use super::middleware::enforce_content_length;
use super::openapi;
use super::AppState;
use crate::error::ScanError;

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods(AnyOrigin)
        .allow_headers(AnyOrigin);

    let upload_limit = state.config.upload.max_bytes;

    // Both spellings are accepted so clients posting to `/upload/` are not redirected
    let uploads = Router::new()
        .route("/upload", post(handlers::upload_image))
        .route("/upload/", post(handlers::upload_image))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            enforce_content_length,
        ))
        .layer(DefaultBodyLimit::max(upload_limit));

    let public_routes = Router::new()
        .route("/", get(handlers::root))
        .route("/ping", post(handlers::ping))
        .route("/health", get(handlers::health_check))
        .route("/uploads/{*filename}", get(handlers::get_upload))
        .route("/openapi.json", get(openapi::openapi_json))
        .merge(openapi::redoc_router());

    Router::new()
        .merge(public_routes)
        .merge(uploads)
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn not_found(uri: Uri) -> ScanError {
    ScanError::NotFound(format!("No route for {}", uri.path()))
}

async fn method_not_allowed(method: Method, uri: Uri) -> ScanError {
    ScanError::MethodNotAllowed(format!("{method} is not allowed on {}", uri.path()))
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(msg) = err.downcast_ref::<String>() {
        msg.clone()
    } else if let Some(msg) = err.downcast_ref::<&str>() {
        msg.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    ScanError::Internal(format!("Handler panicked: {detail}")).into_response()
}
