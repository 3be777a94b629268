//! Bassline -- browser-based KVM access to a Raspberry Pi.
//!
//! This crate provides the debug log collector, its HTTP surface, and the
//! service configuration.

pub mod api;
pub mod config;
pub mod debug_logs;

use anyhow::{Context, Result};

use crate::api::state::AppState;
use crate::config::BasslineConfig;

/// Start the Bassline HTTP server on `bind`.
pub async fn serve(bind: &str, config: &BasslineConfig) -> Result<()> {
    let addr: std::net::SocketAddr = bind
        .parse()
        .with_context(|| format!("invalid bind address: {bind}"))?;
    let app = api::router(AppState::from_config(config));

    tracing::info!(%addr, "Bassline listening");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app).await?;

    Ok(())
}
