mod bot;
mod commands;
mod config;
mod matcher;
mod platform;
mod store;
mod webhook;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::bot::AppState;
use crate::config::Settings;
use crate::platform::telegram::TelegramConnector;
use crate::platform::Connector;
use crate::store::ConfigStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,keyword_relay=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match dotenvy::dotenv() {
        Ok(path) => info!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => warn!("Failed to load .env: {}", e),
    }

    let settings = Settings::from_env().context("Failed to load settings")?;
    info!("Configuration loaded successfully");
    info!("  Public host: {}", settings.telegram.public_host);
    info!("  Data directory: {}", settings.data_dir.display());
    info!(
        "  Proxy: {}",
        settings.telegram.proxy_url.as_deref().unwrap_or("none")
    );

    let store = ConfigStore::open(settings.data_paths())
        .await
        .with_context(|| format!("Failed to open data directory {}", settings.data_dir.display()))?;

    let connector = Arc::new(TelegramConnector::new(settings.telegram.clone()));

    // Register once up front; every request registers again
    if let Err(e) = connector.connect().await {
        warn!("Initial webhook registration failed: {:#}", e);
    }

    let state = Arc::new(AppState::new(connector, store));
    let app = webhook::router(state, &settings.telegram.webhook_path());

    let addr = settings.server.bind_addr;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    info!("Listening for webhook updates on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
