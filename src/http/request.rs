//! Per-request context setup.
//!
//! # Responsibilities
//! - Obtain the correlation id (generated, or a trusted incoming header)
//! - Derive the request context from the transport context (deadline)
//! - Derive the request logger and bind it into that context
//! - Expose the id and context to handlers through request extensions
//!
//! # Design Decisions
//! - Request ID added as early as possible, before any handler logs
//! - Incoming ids are ignored unless explicitly trusted
//! - Handlers extracting `Context` never fail; a missing context is a
//!   background context, whose logger is the process default

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::convert::Infallible;
use std::fmt;
use uuid::Uuid;

use crate::context::Context;
use crate::http::server::AppState;
use crate::logger::ContextLoggerExt;

/// Header carrying the correlation id in both directions.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Longest incoming id accepted when the header is trusted.
const MAX_INCOMING_ID_LEN: usize = 128;

/// Opaque correlation identifier of one request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(String);

impl RequestId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Accept an externally supplied id if it is usable.
    pub fn from_header(value: &HeaderValue) -> Option<Self> {
        let id = value.to_str().ok()?.trim();
        if id.is_empty() || id.len() > MAX_INCOMING_ID_LEN {
            return None;
        }
        Some(Self(id.to_string()))
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<RequestId> for String {
    fn from(id: RequestId) -> Self {
        id.0
    }
}

/// Generate a fresh correlation id (UUID v4).
pub fn generate_id() -> RequestId {
    RequestId(Uuid::new_v4().to_string())
}

/// Middleware establishing the request context.
pub async fn request_context(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let incoming = if state.trust_request_id_header {
        request
            .headers()
            .get(X_REQUEST_ID)
            .and_then(RequestId::from_header)
    } else {
        None
    };
    let request_id = incoming.unwrap_or_else(generate_id);

    // An outer layer may already have supplied a context; derive from it.
    let transport_ctx = request
        .extensions()
        .get::<Context>()
        .cloned()
        .unwrap_or_default()
        .with_timeout(state.request_timeout);

    let logger = state
        .registry
        .get()
        .with()
        .str(state.request_id_field.clone(), request_id.as_str())
        .logger();
    let ctx = transport_ctx.with_logger(logger);

    if let Ok(value) = HeaderValue::from_str(request_id.as_str()) {
        request.headers_mut().insert(X_REQUEST_ID, value);
    }

    tracing::debug!(
        request_id = %request_id,
        method = %request.method(),
        path = %request.uri().path(),
        "Request context established"
    );

    request.extensions_mut().insert(request_id);
    request.extensions_mut().insert(ctx);
    next.run(request).await
}

/// Extracts the context installed by [`request_context`].
///
/// Behind that middleware this is the request context. On a route without it
/// the extractor yields `Context::background()`, whose logger is the global
/// default rather than any registry injected into the server.
impl<S> FromRequestParts<S> for Context
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<Context>().cloned().unwrap_or_default())
    }
}
