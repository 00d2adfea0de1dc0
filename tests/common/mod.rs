//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;

use request_logger::config::{LogOutput, ServiceConfig};
use request_logger::logger::{Logger, LoggerRegistry, MemorySink};
use request_logger::{HttpServer, Shutdown};

/// A running server whose request records land in `sink`.
pub struct TestServer {
    pub addr: SocketAddr,
    pub sink: MemorySink,
    pub shutdown: Shutdown,
}

/// Start a server on an ephemeral port with its own registry.
pub async fn start_server(trust_request_id_header: bool) -> TestServer {
    let sink = MemorySink::new();
    let base = Logger::new(sink.clone()).with_timestamp(false);
    let registry: &'static LoggerRegistry = Box::leak(Box::new(LoggerRegistry::with_default(base)));

    let mut config = ServiceConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.logging.output = LogOutput::Discard;
    config.logging.trust_request_id_header = trust_request_id_header;

    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::with_registry(config, registry);
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    // Give the accept loop a moment to start.
    tokio::time::sleep(Duration::from_millis(50)).await;

    TestServer {
        addr,
        sink,
        shutdown,
    }
}

/// Client that never pools connections between tests.
#[allow(dead_code)]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
