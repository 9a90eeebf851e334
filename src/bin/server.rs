//! Hangar Flight Server
//!
//! Serves the built-in dataset catalog over Arrow Flight.
//!
//! # Configuration
//!
//! - `HANGAR_HOST` / `HANGAR_PORT` - bind address (default 0.0.0.0:8815)
//! - `HANGAR_ADVERTISE` - extra endpoint locations, comma-separated
//! - `HANGAR_BATCH_ROWS` - rows per streamed batch
//! - `RUST_LOG` / `HANGAR_LOG` / `HANGAR_LOG_FORMAT` - logging

use std::sync::Arc;

use tokio::signal;
use tonic::transport::Server;
use tracing::{error, info};

use hangar::storage::seed;
use hangar::{CatalogHandler, HangarFlightService, ServerConfig, VERSION};

#[tokio::main]
async fn main() {
    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            // Still report through the default subscriber
            let _ = ServerConfig::default().init_tracing();
            error!(error = %e, "Invalid configuration");
            std::process::exit(1);
        }
    };
    if let Err(e) = config.init_tracing() {
        eprintln!("{e}");
        std::process::exit(1);
    }

    if let Err(e) = run(config).await {
        error!(error = %e, "Server failed");
        std::process::exit(1);
    }
}

async fn run(config: ServerConfig) -> hangar::Result<()> {
    let addr = config.bind_addr()?;

    let registry = Arc::new(seed::default_registry()?);
    let handler = CatalogHandler::new(Arc::clone(&registry), config.locations())
        .with_max_batch_rows(config.max_batch_rows);

    info!(
        version = VERSION,
        %addr,
        locations = ?handler.locations(),
        datasets = registry.len(),
        "Starting Hangar Flight server"
    );

    let service = HangarFlightService::new(handler);

    Server::builder()
        .add_service(service.into_server())
        .serve_with_shutdown(addr, shutdown_signal())
        .await?;

    info!("Hangar shutdown complete");
    Ok(())
}

/// Wait for SIGINT (Ctrl+C) or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = ?e, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = ?e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
