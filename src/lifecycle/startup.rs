//! Startup orchestration.
//!
//! # Responsibilities
//! - Build and install the base logger before anything can log through it
//! - Start the config watcher and the logger reload task
//! - Bind the listener and serve until shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The default logger is installed before the first request is accepted
//! - Listeners start last (traffic only when ready)

use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::config::{ConfigWatcher, ServiceConfig};
use crate::context::Context;
use crate::http::HttpServer;
use crate::lifecycle::{signals, Shutdown};
use crate::logger::{logger_from, registry};
use crate::observability::logging::{apply_reloads, install_base_logger};

/// Run the service with `config`; `config_path` enables hot reload.
pub async fn run(
    config: ServiceConfig,
    config_path: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    install_base_logger(registry::global(), &config.logging);

    logger_from(&Context::background())
        .info()
        .msg("registering request handlers");

    // Keep the watcher alive for the lifetime of the server.
    let _watcher = match config_path {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(&path);
            let watcher = watcher.run()?;
            tokio::spawn(apply_reloads(registry::global(), updates));
            Some(watcher)
        }
        None => None,
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        request_timeout_secs = config.timeouts.request_secs,
        "Listening for connections"
    );

    let shutdown = Arc::new(Shutdown::new());
    let server_shutdown = shutdown.subscribe();
    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move { signals::forward_to(&signal_shutdown).await });

    HttpServer::new(config).run(listener, server_shutdown).await?;

    logger_from(&Context::background())
        .info()
        .msg("shutdown complete");
    Ok(())
}
