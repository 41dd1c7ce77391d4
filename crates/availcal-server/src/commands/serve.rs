//! `availcal serve`: the HTTP API.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use crate::api::{AppState, router};
use crate::config::AppConfig;
use crate::error::ServerResult;
use crate::signals::ShutdownHandle;

use super::build_aggregator;

/// Serves the API until SIGTERM or SIGINT.
pub async fn run(config: &AppConfig, bind: Option<SocketAddr>) -> ServerResult<()> {
    let aggregator = build_aggregator(config)?;
    let sources = aggregator.registry().len();
    let state = AppState::new(Arc::new(aggregator), config.expose_error_details);

    let listener = TcpListener::bind(bind.unwrap_or(config.server.bind)).await?;
    info!(addr = %listener.local_addr()?, sources, "Listening");

    let shutdown = ShutdownHandle::new();
    shutdown.spawn_listener()?;

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown.wait())
        .await?;

    info!("Server stopped");
    Ok(())
}
