//! # Folio
//!
//! Entry point for the portfolio backend.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

use std::sync::Arc;

use anyhow::Result;
use folio_server::analytics::SystemClock;
use folio_server::config::FolioConfig;
use folio_server::routes::router;
use folio_server::{build_mailer, build_state};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Main entry point.
#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing; FOLIO_LOG_FORMAT=json switches to JSON lines
    let filter = EnvFilter::from_default_env().add_directive("folio=info".parse()?);
    let json = std::env::var("FOLIO_LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));
    if json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .init();
    }

    info!("Folio starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = FolioConfig::load();
    let addr = config.socket_addr()?;
    let state = build_state(&config, build_mailer(&config), Arc::new(SystemClock));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{addr}");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Folio shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
    }
}
