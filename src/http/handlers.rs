//! Route handlers.

use crate::context::Context;
use crate::logger::logger_from;

/// `GET /hello`: hands the request context to the processing step.
pub async fn hello(ctx: Context) -> &'static str {
    process(&ctx);
    "hello\n"
}

/// `GET /health`
pub async fn health() -> &'static str {
    "ok"
}

/// Request processing. Takes only the context; the logger (with the
/// request id and anything else bound upstream) comes from it.
pub fn process(ctx: &Context) {
    logger_from(ctx).info().msg("we are processing a request");
}
