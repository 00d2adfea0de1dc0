//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (correlation id, request Context with bound logger)
//!     → handlers.rs (hello → process(&ctx) → logger_from(&ctx))
//!     → x-request-id echoed on the response
//! ```

pub mod handlers;
pub mod request;
pub mod server;

pub use request::{generate_id, RequestId, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
