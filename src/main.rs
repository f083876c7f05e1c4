use std::sync::Arc;

use anyhow::{Context, Result};

use travel_agent_backend::config::Config;
use travel_agent_backend::{api, build_state, logging};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Arc::new(Config::load());
    logging::init(&config.logging);

    if !config.has_openai_key() {
        tracing::warn!("OPENAI_API_KEY is not set; agent calls will fail");
    }
    if !config.has_serpapi_key() {
        tracing::warn!("SERPAPI_API_KEY is not set; searches will return errors");
    }

    let state = build_state(Arc::clone(&config))?;
    let router = api::router(state);

    let bind = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    tracing::info!(
        %bind,
        model = %config.openai.model,
        debug = config.server.debug,
        "Starting travel agent API"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
