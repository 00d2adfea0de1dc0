//! request-logger service.
//!
//! Serves `GET /hello` and demonstrates request-scoped logging: every record
//! written while handling a request carries that request's correlation id,
//! although no handler ever receives a logger argument.
//!
//! # Architecture Overview
//!
//! ```text
//!   startup ──▶ base Logger ──▶ registry (process default)
//!                                   │
//!   request ──▶ request_context ────┴─▶ derive {requestID} ──▶ Context
//!                                                               │
//!               hello(ctx) ──▶ process(&ctx) ──▶ logger_from(&ctx) ──▶ sink
//! ```

use clap::Parser;
use std::path::PathBuf;

use request_logger::config::{load_config, ServiceConfig};
use request_logger::lifecycle::startup;
use request_logger::observability::logging::init_tracing;

#[derive(Parser)]
#[command(name = "request-logger")]
#[command(about = "HTTP service with context-carried request loggers", long_about = None)]
struct Cli {
    /// TOML configuration file; watched for changes to the logging section.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServiceConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    init_tracing(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config_file = ?cli.config,
        bind_address = %config.listener.bind_address,
        "request-logger starting"
    );

    startup::run(config, cli.config).await
}
