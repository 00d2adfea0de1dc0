//! Process-wide default logger.
//!
//! # Responsibilities
//! - Hold the base logger used when a context carries none
//! - Allow replacing it at runtime (config reload)
//!
//! # Design Decisions
//! - Slot is an atomic reference (`arc-swap`): readers see the old or the
//!   new logger, never a torn one, and never block
//! - Reading an empty slot yields a discard logger instead of failing
//! - `LoggerRegistry` is an ordinary value; the global is one static instance

use arc_swap::ArcSwapOption;
use std::sync::Arc;

use crate::logger::handle::Logger;

/// Single slot holding a default [`Logger`].
pub struct LoggerRegistry {
    slot: ArcSwapOption<Logger>,
}

impl LoggerRegistry {
    /// Create an empty registry.
    pub const fn new() -> Self {
        Self {
            slot: ArcSwapOption::const_empty(),
        }
    }

    /// Create a registry already holding `logger`.
    pub fn with_default(logger: Logger) -> Self {
        let registry = Self::new();
        registry.set(logger);
        registry
    }

    /// Install `logger`, replacing any previous one.
    pub fn set(&self, logger: Logger) {
        self.slot.store(Some(Arc::new(logger)));
    }

    /// The installed logger, or a discard logger when none was installed.
    pub fn get(&self) -> Logger {
        match self.slot.load().as_deref() {
            Some(logger) => logger.clone(),
            None => Logger::discard(),
        }
    }

    pub fn is_set(&self) -> bool {
        self.slot.load().is_some()
    }
}

impl Default for LoggerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LoggerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoggerRegistry")
            .field("default", &self.slot.load().as_deref())
            .finish()
    }
}

static GLOBAL: LoggerRegistry = LoggerRegistry::new();

/// The process-wide registry.
pub fn global() -> &'static LoggerRegistry {
    &GLOBAL
}

/// Install the process-wide default logger.
///
/// Call at startup before serving requests. Calling again replaces the
/// default; concurrent readers observe either logger atomically.
pub fn set_default(logger: Logger) {
    GLOBAL.set(logger);
}

/// The process-wide default logger (a discard logger if never set).
pub fn get_default() -> Logger {
    GLOBAL.get()
}

pub fn is_default_set() -> bool {
    GLOBAL.is_set()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::sink::MemorySink;

    #[test]
    fn test_empty_registry_falls_back_to_discard() {
        let registry = LoggerRegistry::new();
        assert!(!registry.is_set());

        let logger = registry.get();
        assert!(logger.fields().is_empty());
        // Emitting through the fallback must be harmless.
        logger.error().msg("nobody hears this");
    }

    #[test]
    fn test_set_then_get() {
        let sink = MemorySink::new();
        let base = Logger::new(sink.clone()).with().str("service", "api").logger();
        let registry = LoggerRegistry::with_default(base.clone());

        assert!(registry.is_set());
        assert_eq!(registry.get(), base);

        registry.get().info().msg("hello");
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_last_write_wins() {
        let first = Logger::new(MemorySink::new());
        let second = Logger::new(MemorySink::new());
        let registry = LoggerRegistry::new();

        registry.set(first.clone());
        registry.set(second.clone());

        assert_eq!(registry.get(), second);
        assert_ne!(registry.get(), first);
    }

    #[test]
    fn test_concurrent_readers_see_whole_loggers() {
        let a = Logger::new(MemorySink::new()).with().str("gen", "a").logger();
        let b = Logger::new(MemorySink::new()).with().str("gen", "b").logger();
        let registry = Arc::new(LoggerRegistry::with_default(a.clone()));

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let registry = registry.clone();
                let (a, b) = (a.clone(), b.clone());
                std::thread::spawn(move || {
                    for _ in 0..1_000 {
                        let current = registry.get();
                        assert!(current == a || current == b);
                    }
                })
            })
            .collect();

        for i in 0..1_000 {
            registry.set(if i % 2 == 0 { b.clone() } else { a.clone() });
        }
        for reader in readers {
            reader.join().unwrap();
        }
    }
}
