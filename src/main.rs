//! caselog server - binary entry point
//!
//! Replays the event log, then serves the HTTP API until SIGINT or SIGTERM.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use caselog::api::http::create_router;
use caselog::api::AppState;
use caselog::config::Config;
use caselog::model::Model;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    // The projection must be complete before the first request is accepted
    let model = match Model::open(config.store_config()) {
        Ok(model) => Arc::new(model),
        Err(e) => {
            error!(path = %config.data_file.display(), error = %e, "Refusing to start");
            return Err(e.into());
        }
    };

    let app = create_router(Arc::new(AppState::new(model)));

    let addr = config.addr();
    let listener = TcpListener::bind(&addr).await?;
    info!(addr = %addr, version = caselog::VERSION, "Server starts and listens");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server is down");
    Ok(())
}

/// Resolves on the first SIGINT (Ctrl+C) or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
