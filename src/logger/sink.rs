//! Log sinks.
//!
//! # Responsibilities
//! - Receive fully assembled records from loggers
//! - Serialize them (JSON lines or human-readable text)
//! - Write them to the configured output
//!
//! # Design Decisions
//! - Sinks never return errors; a failed write is dropped
//! - Writers are guarded by a mutex so lines never interleave
//! - Each record reaches the writer in a single `write_all`, newline included,
//!   so other writers sharing the same stream cannot split it
//! - A poisoned mutex is recovered instead of propagating the panic

use chrono::SecondsFormat;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::logger::field::FieldValue;
use crate::logger::record::{Level, Record};

/// Destination for log records.
pub trait Sink: Send + Sync {
    fn emit(&self, record: &Record);
}

/// Output encoding for [`WriterSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterFormat {
    /// One JSON object per line.
    Json,
    /// `<time> <LVL> <message> key=value ...`
    Pretty,
}

/// Sink writing encoded records to an `io::Write`.
pub struct WriterSink {
    writer: Mutex<Box<dyn Write + Send>>,
    format: WriterFormat,
}

impl WriterSink {
    pub fn new(writer: impl Write + Send + 'static, format: WriterFormat) -> Self {
        let writer: Box<dyn Write + Send> = Box::new(writer);
        Self {
            writer: Mutex::new(writer),
            format,
        }
    }

    pub fn stderr(format: WriterFormat) -> Self {
        Self::new(io::stderr(), format)
    }

    pub fn stdout(format: WriterFormat) -> Self {
        Self::new(io::stdout(), format)
    }

    pub fn format(&self) -> WriterFormat {
        self.format
    }

    fn lock(&self) -> MutexGuard<'_, Box<dyn Write + Send>> {
        self.writer.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Sink for WriterSink {
    fn emit(&self, record: &Record) {
        let mut line = match self.format {
            WriterFormat::Json => match encode_json(record) {
                Ok(line) => line,
                Err(_) => return,
            },
            WriterFormat::Pretty => encode_pretty(record),
        };
        line.push('\n');

        let mut writer = self.lock();
        let _ = writer.write_all(line.as_bytes());
        let _ = writer.flush();
    }
}

/// Encode a record as a single JSON object (no trailing newline).
pub fn encode_json(record: &Record) -> Result<String, serde_json::Error> {
    serde_json::to_string(&JsonRecord(record))
}

/// Encode a record as a human-readable line (no trailing newline).
///
/// String values that are empty or contain whitespace, quotes, `=` or control
/// characters are quoted and escaped; nested values are rendered as JSON.
pub fn encode_pretty(record: &Record) -> String {
    let mut line = String::new();
    if let Some(time) = record.time {
        line.push_str(&time.to_rfc3339_opts(SecondsFormat::Millis, true));
        line.push(' ');
    }
    line.push_str(pretty_level(record.level));
    line.push(' ');
    line.push_str(&record.message);
    for (key, value) in record.fields.iter() {
        line.push(' ');
        line.push_str(key);
        line.push('=');
        push_pretty_value(&mut line, value);
    }
    line
}

fn push_pretty_value(line: &mut String, value: &FieldValue) {
    match value {
        FieldValue::Str(s) if needs_quote(s) => push_quoted(line, s),
        FieldValue::Nested(fields) => match serde_json::to_string(fields) {
            Ok(json) => line.push_str(&json),
            Err(_) => line.push_str(&value.to_string()),
        },
        _ => line.push_str(&value.to_string()),
    }
}

fn needs_quote(s: &str) -> bool {
    s.is_empty()
        || s
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || c == '"' || c == '=')
}

fn push_quoted(line: &mut String, s: &str) {
    match serde_json::to_string(s) {
        Ok(quoted) => line.push_str(&quoted),
        Err(_) => line.push_str(s),
    }
}

fn pretty_level(level: Level) -> &'static str {
    match level {
        Level::Trace => "TRC",
        Level::Debug => "DBG",
        Level::Info => "INF",
        Level::Warn => "WRN",
        Level::Error => "ERR",
    }
}

struct JsonRecord<'a>(&'a Record);

impl Serialize for JsonRecord<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let record = self.0;
        let mut map = serializer.serialize_map(None)?;
        if let Some(time) = record.time {
            map.serialize_entry("time", &time.to_rfc3339_opts(SecondsFormat::Millis, true))?;
        }
        map.serialize_entry("level", record.level.as_str())?;
        for (key, value) in record.fields.iter() {
            map.serialize_entry(&**key, value)?;
        }
        map.serialize_entry("message", &record.message)?;
        map.end()
    }
}

/// Sink that drops every record.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardSink;

impl Sink for DiscardSink {
    fn emit(&self, _record: &Record) {}
}

/// Sink forwarding records into the `tracing` ecosystem.
///
/// `tracing` needs field names at compile time, so structured fields travel
/// as one JSON-encoded `fields` attribute.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl Sink for TracingSink {
    fn emit(&self, record: &Record) {
        let fields = serde_json::to_string(&record.fields).unwrap_or_default();
        let message = record.message.as_str();
        match record.level {
            Level::Trace => tracing::trace!(target: "request_logger::record", fields = %fields, "{}", message),
            Level::Debug => tracing::debug!(target: "request_logger::record", fields = %fields, "{}", message),
            Level::Info => tracing::info!(target: "request_logger::record", fields = %fields, "{}", message),
            Level::Warn => tracing::warn!(target: "request_logger::record", fields = %fields, "{}", message),
            Level::Error => tracing::error!(target: "request_logger::record", fields = %fields, "{}", message),
        }
    }
}

/// Sink that keeps records in memory.
///
/// Clones share the same buffer, so a handle can be kept for inspection after
/// the sink is moved into a logger.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<Record>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every record emitted so far.
    pub fn records(&self) -> Vec<Record> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Record>> {
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Sink for MemorySink {
    fn emit(&self, record: &Record) {
        self.lock().push(record.clone());
    }
}
