//! Request-scoped structured logging carried through an execution context.

pub mod config;
pub mod context;
pub mod http;
pub mod lifecycle;
pub mod logger;
pub mod observability;

pub use config::ServiceConfig;
pub use context::{Context, ContextKey};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use logger::{logger_from, with_logger, ContextLoggerExt, Fields, Logger};
