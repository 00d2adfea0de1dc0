//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, timeout, request context, request ID echo)
//! - Bind server to listener
//! - Stop on the shutdown broadcast

use axum::{middleware, routing::get, Router};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{request_id::PropagateRequestIdLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ServiceConfig;
use crate::http::handlers::{health, hello};
use crate::http::request::request_context;
use crate::logger::{registry, LoggerRegistry};

/// Application state injected into the request middleware.
#[derive(Clone)]
pub struct AppState {
    /// Source of the base logger each request logger is derived from.
    pub registry: &'static LoggerRegistry,
    pub request_id_field: String,
    pub trust_request_id_header: bool,
    pub request_timeout: Duration,
}

impl AppState {
    pub fn from_config(config: &ServiceConfig, registry: &'static LoggerRegistry) -> Self {
        Self {
            registry,
            request_id_field: config.logging.request_id_field.trim().to_string(),
            trust_request_id_header: config.logging.trust_request_id_header,
            request_timeout: Duration::from_secs(config.timeouts.request_secs),
        }
    }
}

/// HTTP server exposing the request handlers.
pub struct HttpServer {
    router: Router,
    config: ServiceConfig,
}

impl HttpServer {
    /// Create a server whose request loggers derive from the process-wide default.
    pub fn new(config: ServiceConfig) -> Self {
        Self::with_registry(config, registry::global())
    }

    /// Create a server deriving request loggers from `registry`.
    ///
    /// Only the request middleware consults `registry`: every routed request
    /// gets a context with a logger derived from it. Code that calls
    /// [`logger_from`](crate::logger::logger_from) on a context with no bound
    /// logger (e.g. `Context::background()` outside a request) still falls
    /// back to the process-wide default in [`registry::global`].
    pub fn with_registry(config: ServiceConfig, registry: &'static LoggerRegistry) -> Self {
        let state = AppState::from_config(&config, registry);
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// The last layer added runs first: the request context must be in place
    /// before `PropagateRequestIdLayer` copies the id header to the response.
    #[allow(deprecated)]
    fn build_router(config: &ServiceConfig, state: AppState) -> Router {
        Router::new()
            .route("/hello", get(hello))
            .route("/health", get(health))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(middleware::from_fn_with_state(state, request_context))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(TraceLayer::new_for_http())
    }

    /// The router, for driving the service without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until a shutdown signal is broadcast.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogOutput;
    use crate::logger::{FieldValue, Logger, MemorySink};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn test_server(sink: &MemorySink, trust_header: bool) -> HttpServer {
        let registry: &'static LoggerRegistry = Box::leak(Box::new(LoggerRegistry::with_default(
            Logger::new(sink.clone()).with().str("service", "test").logger(),
        )));
        let mut config = ServiceConfig::default();
        config.logging.output = LogOutput::Discard;
        config.logging.trust_request_id_header = trust_header;
        HttpServer::with_registry(config, registry)
    }

    #[tokio::test]
    async fn test_hello_logs_with_request_id() {
        let sink = MemorySink::new();
        let server = test_server(&sink, false);

        let response = server
            .router()
            .oneshot(Request::get("/hello").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let header_id = response
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .unwrap()
            .to_string();

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].field("requestID"), Some(&FieldValue::Str(header_id)));
        assert_eq!(records[0].field("service"), Some(&FieldValue::Str("test".into())));
    }

    #[tokio::test]
    async fn test_untrusted_header_is_replaced() {
        let sink = MemorySink::new();
        let server = test_server(&sink, false);

        let response = server
            .router()
            .oneshot(
                Request::get("/hello")
                    .header("x-request-id", "client-chosen")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let header_id = response.headers().get("x-request-id").unwrap();
        assert_ne!(header_id, "client-chosen");
    }

    #[tokio::test]
    async fn test_trusted_header_is_reused() {
        let sink = MemorySink::new();
        let server = test_server(&sink, true);

        let response = server
            .router()
            .oneshot(
                Request::get("/hello")
                    .header("x-request-id", "upstream-42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.headers().get("x-request-id").unwrap(), "upstream-42");
        assert_eq!(
            sink.records()[0].field("requestID"),
            Some(&FieldValue::Str("upstream-42".into()))
        );
    }

    #[tokio::test]
    async fn test_unrepresentable_timeout_still_serves() {
        let sink = MemorySink::new();
        let registry: &'static LoggerRegistry =
            Box::leak(Box::new(LoggerRegistry::with_default(Logger::new(sink.clone()))));
        let mut config = ServiceConfig::default();
        config.timeouts.request_secs = i64::MAX as u64;
        let router = HttpServer::with_registry(config, registry).router();

        let handle = tokio::spawn(async move {
            router
                .oneshot(Request::get("/hello").body(Body::empty()).unwrap())
                .await
                .unwrap()
                .status()
        });

        assert_eq!(handle.await.unwrap(), StatusCode::OK);
        assert_eq!(sink.len(), 1);
    }

    #[tokio::test]
    async fn test_health() {
        let sink = MemorySink::new();
        let server = test_server(&sink, false);

        let response = server
            .router()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"ok");
        assert!(sink.is_empty());
    }
}
