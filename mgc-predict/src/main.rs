//! mgc-predict - Music genre classification service
//!
//! Loads the feature scaler and both classifiers once, then serves
//! `POST /predict-genre` until Ctrl+C or SIGTERM.

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use mgc_predict::config::{Args, ServiceConfig};
use mgc_predict::{build_router, AppState, GenrePredictor};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // TOML is read before tracing is installed so its [logging] level applies
    let config = ServiceConfig::load(&args).context("Failed to load configuration")?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            format!("mgc_predict={},tower_http=info", config.logging.level).into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting mgc-predict (Music Genre Classifier)");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    match &config.config_file {
        Some(path) => info!("Config: {}", path.display()),
        None => info!("No config file found, using CLI/ENV settings and defaults"),
    }
    info!("Shallow model: {}", config.models.mlp.display());
    info!("Deep model: {}", config.models.cnn.display());
    info!("Scaler: {}", config.models.scaler.display());

    let predictor =
        GenrePredictor::from_config(&config.models).context("Failed to load model artifacts")?;

    let state = AppState::new(predictor, config.limits);
    let app = build_router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
