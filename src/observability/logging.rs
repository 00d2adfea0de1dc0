//! Structured logging setup.
//!
//! # Responsibilities
//! - Initialize the `tracing` subscriber for the service's own diagnostics
//! - Build the base request Logger from configuration
//! - Install it into a registry, at startup and on every config reload
//!
//! # Design Decisions
//! - Two channels: `tracing` for service internals, `Logger` for request records
//! - The `tracing` format routes request records through the subscriber too
//! - Log level configurable via config and environment

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, LogOutput, LoggingConfig, ObservabilityConfig, ServiceConfig};
use crate::logger::{
    DiscardSink, Level, Logger, LoggerRegistry, Sink, TracingSink, WriterFormat, WriterSink,
};

/// Install the global `tracing` subscriber. `RUST_LOG` overrides the config filter.
pub fn init_tracing(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.filter.as_str()));

    let result = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();

    if let Err(e) = result {
        eprintln!("tracing subscriber already installed: {}", e);
    }
}

fn build_sink(config: &LoggingConfig) -> Arc<dyn Sink> {
    match (config.format, config.output) {
        (_, LogOutput::Discard) => Arc::new(DiscardSink),
        (LogFormat::Tracing, _) => Arc::new(TracingSink),
        (LogFormat::Json, LogOutput::Stderr) => Arc::new(WriterSink::stderr(WriterFormat::Json)),
        (LogFormat::Json, LogOutput::Stdout) => Arc::new(WriterSink::stdout(WriterFormat::Json)),
        (LogFormat::Pretty, LogOutput::Stderr) => {
            Arc::new(WriterSink::stderr(WriterFormat::Pretty))
        }
        (LogFormat::Pretty, LogOutput::Stdout) => {
            Arc::new(WriterSink::stdout(WriterFormat::Pretty))
        }
    }
}

/// Build the base logger described by `config`.
pub fn build_base_logger(config: &LoggingConfig) -> Logger {
    build_base_logger_with_sink(config, build_sink(config))
}

/// Build the base logger around an explicit sink (level, timestamp and
/// static fields still come from `config`).
pub fn build_base_logger_with_sink(config: &LoggingConfig, sink: Arc<dyn Sink>) -> Logger {
    let level = config.level.parse::<Level>().unwrap_or(Level::Info);

    let mut builder = Logger::from_shared(sink)
        .with_timestamp(config.timestamp)
        .with()
        .level(level);
    for (key, value) in &config.static_fields {
        builder = builder.str(key.clone(), value.as_str());
    }
    builder.logger()
}

/// Build the base logger and make it the registry default.
pub fn install_base_logger(registry: &LoggerRegistry, config: &LoggingConfig) -> Logger {
    let logger = build_base_logger(config);
    registry.set(logger.clone());

    tracing::info!(
        level = %logger.level(),
        format = ?config.format,
        output = ?config.output,
        static_fields = config.static_fields.len(),
        "Base logger installed"
    );
    logger
}

/// Apply reloaded configurations until the sender side closes.
pub async fn apply_reloads(
    registry: &LoggerRegistry,
    mut updates: mpsc::UnboundedReceiver<ServiceConfig>,
) {
    while let Some(config) = updates.recv().await {
        install_base_logger(registry, &config.logging);
    }
    tracing::debug!("Config update channel closed");
}
