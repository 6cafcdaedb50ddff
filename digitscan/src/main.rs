use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use digitscan::api::{create_router, AppState};
use digitscan::config::Config;
use digitscan::ocr::OcrProvider;
use digitscan::storage::ImageStore;

#[derive(Parser)]
#[command(name = "digitscan")]
#[command(about = "Upload images and read the digits in them")]
struct Args {
    /// Start even when the OCR engine cannot be run. Uploads are still
    /// stored but report `ocr_engine_missing`.
    #[arg(long)]
    allow_missing_engine: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    dotenvy::dotenv().ok();

    init_tracing();

    let config = Config::from_env();
    config.validate()?;

    let store = ImageStore::new(&config.storage.root).await?;

    let ocr = OcrProvider::new(&config.ocr);
    match ocr.probe().await {
        Ok(version) => tracing::info!(
            engine = %ocr.engine_path().display(),
            version = %version,
            "OCR engine ready"
        ),
        Err(e) if args.allow_missing_engine => tracing::warn!(
            error = %e,
            "OCR engine unavailable, uploads will be stored without digit recognition"
        ),
        Err(e) => anyhow::bail!(
            "{e}. Install Tesseract, point TESSERACT_CMD at it, or pass --allow-missing-engine"
        ),
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(config, store, ocr);
    let app = create_router(state);

    tracing::info!("digitscan starting on http://{}", addr);
    tracing::info!("  Health check: http://{}/health", addr);
    tracing::info!("  API docs:     http://{}/docs", addr);
    tracing::info!("  OpenAPI spec: http://{}/openapi.json", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// `RUST_LOG` picks the filter, `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "digitscan=info,tower_http=debug".into());
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, finishing in-flight requests...");
}
