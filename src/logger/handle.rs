//! The logger handle.
//!
//! A `Logger` is a cheap, immutable value: a shared sink, a minimum level and
//! an accumulated field set. Sub-loggers are derived with [`Logger::with`] or
//! [`Logger::derive`]; neither touches the parent.

use chrono::Utc;
use std::fmt;
use std::sync::Arc;

use crate::logger::field::{FieldKey, FieldValue, Fields};
use crate::logger::record::{Level, Record};
use crate::logger::sink::{DiscardSink, Sink};

/// Immutable handle to a sink plus the fields attached to every message.
#[derive(Clone)]
pub struct Logger {
    sink: Arc<dyn Sink>,
    fields: Arc<Fields>,
    level: Level,
    timestamp: bool,
}

impl Logger {
    /// Create a logger writing to `sink` at `Info` level with timestamps.
    pub fn new(sink: impl Sink + 'static) -> Self {
        Self::from_shared(Arc::new(sink))
    }

    /// Create a logger around an already shared sink.
    pub fn from_shared(sink: Arc<dyn Sink>) -> Self {
        Self {
            sink,
            fields: Arc::new(Fields::new()),
            level: Level::Info,
            timestamp: true,
        }
    }

    /// A logger that drops everything.
    pub fn discard() -> Self {
        Self::new(DiscardSink)
    }

    /// Same logger with a different minimum level.
    pub fn with_level(&self, level: Level) -> Self {
        Self {
            level,
            ..self.clone()
        }
    }

    /// Same logger with timestamps switched on or off.
    pub fn with_timestamp(&self, timestamp: bool) -> Self {
        Self {
            timestamp,
            ..self.clone()
        }
    }

    /// Start building a sub-logger that inherits this logger's fields.
    pub fn with(&self) -> LoggerBuilder {
        LoggerBuilder {
            parent: self.clone(),
            fields: (*self.fields).clone(),
        }
    }

    /// Return a new logger with `fields` appended; later keys override.
    pub fn derive(&self, fields: &Fields) -> Self {
        if fields.is_empty() {
            return self.clone();
        }
        let mut merged = (*self.fields).clone();
        merged.extend(fields);
        Self {
            fields: Arc::new(merged),
            ..self.clone()
        }
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn enabled(&self, level: Level) -> bool {
        level >= self.level
    }

    /// True when both handles write to the same sink instance.
    pub fn shares_sink_with(&self, other: &Logger) -> bool {
        Arc::ptr_eq(&self.sink, &other.sink)
    }

    pub fn trace(&self) -> Event<'_> {
        self.event(Level::Trace)
    }

    pub fn debug(&self) -> Event<'_> {
        self.event(Level::Debug)
    }

    pub fn info(&self) -> Event<'_> {
        self.event(Level::Info)
    }

    pub fn warn(&self) -> Event<'_> {
        self.event(Level::Warn)
    }

    pub fn error(&self) -> Event<'_> {
        self.event(Level::Error)
    }

    /// Start an event at `level`. Disabled levels yield an inert event.
    pub fn event(&self, level: Level) -> Event<'_> {
        Event {
            logger: self,
            level,
            fields: if self.enabled(level) { Some(Fields::new()) } else { None },
        }
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::discard()
    }
}

impl PartialEq for Logger {
    /// Two loggers are equivalent when they emit the same fields at the same
    /// level into the same sink.
    fn eq(&self, other: &Self) -> bool {
        self.shares_sink_with(other)
            && self.level == other.level
            && self.timestamp == other.timestamp
            && self.fields == other.fields
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("level", &self.level)
            .field("timestamp", &self.timestamp)
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

/// Builder for a sub-logger; see [`Logger::with`].
#[must_use = "call .logger() to obtain the derived logger"]
pub struct LoggerBuilder {
    parent: Logger,
    fields: Fields,
}

impl LoggerBuilder {
    pub fn str(self, key: impl Into<FieldKey>, value: impl Into<String>) -> Self {
        self.field(key, value.into())
    }

    pub fn int(self, key: impl Into<FieldKey>, value: i64) -> Self {
        self.field(key, value)
    }

    pub fn uint(self, key: impl Into<FieldKey>, value: u64) -> Self {
        self.field(key, value)
    }

    pub fn float(self, key: impl Into<FieldKey>, value: f64) -> Self {
        self.field(key, value)
    }

    pub fn bool(self, key: impl Into<FieldKey>, value: bool) -> Self {
        self.field(key, value)
    }

    pub fn field(mut self, key: impl Into<FieldKey>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(key, value);
        self
    }

    pub fn fields(mut self, fields: &Fields) -> Self {
        self.fields.extend(fields);
        self
    }

    pub fn level(mut self, level: Level) -> Self {
        self.parent.level = level;
        self
    }

    /// Finish the sub-logger.
    pub fn logger(self) -> Logger {
        Logger {
            fields: Arc::new(self.fields),
            ..self.parent
        }
    }
}

/// A single log event under construction; emitted by [`Event::msg`].
#[must_use = "an event is only emitted by .msg()"]
pub struct Event<'a> {
    logger: &'a Logger,
    level: Level,
    /// `None` when the level is disabled.
    fields: Option<Fields>,
}

impl Event<'_> {
    pub fn enabled(&self) -> bool {
        self.fields.is_some()
    }

    pub fn str(self, key: impl Into<FieldKey>, value: impl Into<String>) -> Self {
        self.field(key, value.into())
    }

    pub fn int(self, key: impl Into<FieldKey>, value: i64) -> Self {
        self.field(key, value)
    }

    pub fn uint(self, key: impl Into<FieldKey>, value: u64) -> Self {
        self.field(key, value)
    }

    pub fn float(self, key: impl Into<FieldKey>, value: f64) -> Self {
        self.field(key, value)
    }

    pub fn bool(self, key: impl Into<FieldKey>, value: bool) -> Self {
        self.field(key, value)
    }

    /// Attach an error's display text under `error`.
    pub fn err(self, error: &dyn std::error::Error) -> Self {
        if !self.enabled() {
            return self;
        }
        self.field("error", error.to_string())
    }

    pub fn field(mut self, key: impl Into<FieldKey>, value: impl Into<FieldValue>) -> Self {
        if let Some(fields) = self.fields.as_mut() {
            fields.insert(key, value);
        }
        self
    }

    /// Emit the event with `message`.
    pub fn msg(self, message: impl Into<String>) {
        let Some(event_fields) = self.fields else {
            return;
        };
        let logger = self.logger;

        let mut fields = (*logger.fields).clone();
        fields.extend(&event_fields);

        let record = Record {
            time: logger.timestamp.then(Utc::now),
            level: self.level,
            message: message.into(),
            fields,
        };
        logger.sink.emit(&record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::sink::MemorySink;

    fn memory_logger() -> (Logger, MemorySink) {
        let sink = MemorySink::new();
        (Logger::new(sink.clone()), sink)
    }

    #[test]
    fn test_sub_logger_does_not_touch_parent() {
        let (base, sink) = memory_logger();
        let child = base.with().str("requestID", "abc-123").logger();

        base.info().msg("from base");
        child.info().msg("from child");

        let records = sink.records();
        assert_eq!(records.len(), 2);
        assert!(records[0].field("requestID").is_none());
        assert_eq!(
            records[1].field("requestID"),
            Some(&FieldValue::Str("abc-123".into()))
        );
        assert!(base.shares_sink_with(&child));
    }

    #[test]
    fn test_event_fields_override_logger_fields() {
        let (base, sink) = memory_logger();
        let logger = base.with().str("stage", "parse").int("attempt", 1).logger();

        logger.warn().str("stage", "validate").msg("retrying");

        let record = &sink.records()[0];
        assert_eq!(record.level, Level::Warn);
        assert_eq!(record.field("stage"), Some(&FieldValue::Str("validate".into())));
        assert_eq!(record.field("attempt"), Some(&FieldValue::Int(1)));
        // Logger itself is untouched by event fields
        assert_eq!(logger.fields().get("stage"), Some(&FieldValue::Str("parse".into())));
    }

    #[test]
    fn test_level_filtering() {
        let (base, sink) = memory_logger();
        let logger = base.with_level(Level::Warn);

        logger.debug().msg("dropped");
        logger.info().str("k", "v").msg("dropped too");
        logger.error().msg("kept");

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].message, "kept");
    }

    #[test]
    fn test_timestamp_toggle() {
        let (base, sink) = memory_logger();
        base.info().msg("stamped");
        base.with_timestamp(false).info().msg("bare");

        let records = sink.records();
        assert!(records[0].time.is_some());
        assert!(records[1].time.is_none());
    }

    #[test]
    fn test_derive_empty_is_identity() {
        let (base, _) = memory_logger();
        assert_eq!(base.derive(&Fields::new()), base);
    }

    #[test]
    fn test_equality_requires_same_sink() {
        let (a, _) = memory_logger();
        let (b, _) = memory_logger();
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn test_err_field() {
        let (base, sink) = memory_logger();
        let error = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        base.error().err(&error).msg("write failed");

        assert_eq!(
            sink.records()[0].field("error"),
            Some(&FieldValue::Str("disk full".into()))
        );
    }
}
