//! Hotspot portal - WiFi captive-portal payment server

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hotspot_portal::{
    api::{self, AppState},
    client::BackendClient,
    config::Config,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hotspot_portal=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting hotspot portal...");

    // Load configuration
    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    let backend = Arc::new(BackendClient::new(&config.backend)?);
    tracing::info!(
        "Backend API at {} ({:?})",
        backend.base_url(),
        config.backend.environment
    );

    let state = AppState::new(backend, &config.payment)?;

    // Evict idle payment watches (runs every 10 seconds)
    {
        let watches = state.watches.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(10));
            loop {
                interval.tick().await;
                watches.run_pending_tasks().await;
                if !watches.is_empty() {
                    tracing::debug!(active = watches.len(), "Payment watches running");
                }
            }
        });
    }

    // Build router
    let app = api::build_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
