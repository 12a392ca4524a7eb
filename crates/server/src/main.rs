// crates/server/src/main.rs
//! marketlens server binary.
//!
//! Server-first startup: bind and serve immediately, then connect the
//! database adapter in the background. Data routes answer 503 until the
//! adapter is ready.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use marketlens_db::{Connection, Database};
use marketlens_server::config::Args;
use marketlens_server::{create_app, logging, metrics, AppState};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(&args.log_level, args.log_json)?;
    metrics::init_metrics();

    let config = args.connection_config()?;
    let conn = Arc::new(Connection::new(config));
    let state = AppState::new(Database::new(conn.clone()));
    let app = create_app(state);

    let addr = args.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(
        %addr,
        version = env!("CARGO_PKG_VERSION"),
        backend = conn.backend_kind().name(),
        endpoint = %conn.endpoint(),
        "marketlens listening"
    );

    let connector = conn.clone();
    tokio::spawn(async move {
        match connector.connect().await {
            Ok(()) => info!(endpoint = %connector.endpoint(), "Database ready"),
            Err(e) => error!(error = %e, "Database unavailable; data routes will return 503"),
        }
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    conn.close().await;
    info!("Shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
