use anyhow::Context;

use crate::app::{app, AppState};
use crate::config::AppConfig;

/// Bind and serve until Ctrl-C
pub async fn serve(config: &AppConfig, port: Option<u16>) -> anyhow::Result<()> {
    tracing::info!("Starting LMS API in {:?} mode", config.environment);

    let store = crate::cli::build_store(config).await?;
    let router = app(AppState::new(store));

    let port = port.unwrap_or(config.api.port);
    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("LMS API listening on http://{}", bind_addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
