//! `canlinkd serve` - run the HTTP gateway

use std::sync::Arc;

use anyhow::{Context, Result};
use canlink_api::{create_router, AppState};
use canlink_session::SessionRegistry;
use tokio::net::TcpListener;

use crate::config::Config;

pub async fn run(config: Config, port: Option<u16>) -> Result<()> {
    let port = port.unwrap_or(config.server.port);
    let factory = config.driver_factory();
    let stream_config = config.stream_config();

    tracing::info!(
        default_driver = ?config.driver,
        overrides = config.channels.len(),
        poll_ms = config.stream.poll_interval_ms,
        "Driver configuration loaded"
    );

    let registry = Arc::new(SessionRegistry::new(Arc::new(factory)));
    let state = AppState::new(registry.clone()).with_stream_config(stream_config);
    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!(open_sessions = registry.len(), "Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}
