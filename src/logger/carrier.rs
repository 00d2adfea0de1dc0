//! Carrying a logger inside a [`Context`].
//!
//! Downstream code calls [`logger_from`] (or `ctx.logger()`) and gets the
//! request logger bound by whoever created the context, without the logger
//! ever appearing in a function signature.

use crate::context::{Context, ContextKey};
use crate::logger::field::Fields;
use crate::logger::handle::Logger;
use crate::logger::registry;

/// Reserved key. Private, so no other code can bind or shadow it.
struct LoggerKey;

impl ContextKey for LoggerKey {
    type Value = Logger;
}

/// Logger bound nearest to `ctx`, or the process-wide default.
///
/// The fallback is always the global registry, never an injected
/// [`LoggerRegistry`](crate::logger::LoggerRegistry); bind a logger into the
/// context to use anything else.
pub fn logger_from(ctx: &Context) -> Logger {
    match ctx.value::<LoggerKey>() {
        Some(logger) => logger.clone(),
        None => registry::get_default(),
    }
}

/// Child of `ctx` with `logger` bound. `ctx` itself is unchanged.
pub fn with_logger(ctx: &Context, logger: Logger) -> Context {
    ctx.with_value::<LoggerKey>(logger)
}

/// New logger with `fields` appended to `logger`'s; later keys win.
pub fn derive(logger: &Logger, fields: &Fields) -> Logger {
    logger.derive(fields)
}

/// Method-call forms of [`logger_from`] and [`with_logger`].
pub trait ContextLoggerExt {
    fn logger(&self) -> Logger;

    fn with_logger(&self, logger: Logger) -> Context;

    /// Bind a sub-logger of the current one carrying `fields`.
    fn with_fields(&self, fields: &Fields) -> Context;
}

impl ContextLoggerExt for Context {
    fn logger(&self) -> Logger {
        logger_from(self)
    }

    fn with_logger(&self, logger: Logger) -> Context {
        with_logger(self, logger)
    }

    fn with_fields(&self, fields: &Fields) -> Context {
        with_logger(self, derive(&logger_from(self), fields))
    }
}
