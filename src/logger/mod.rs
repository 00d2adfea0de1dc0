//! Structured, context-carried logging.
//!
//! # Data Flow
//! ```text
//! startup:
//!     base Logger (sink + static fields)
//!     → registry::set_default
//!
//! per request:
//!     registry default
//!     → derive {requestID}       (carrier::derive / Logger::with)
//!     → bind into Context        (carrier::with_logger)
//!     → downstream code          (carrier::logger_from)
//!     → Event → Record → Sink
//! ```
//!
//! # Design Decisions
//! - Loggers are immutable values; deriving shares the sink
//! - Lookup is total: an unbound context yields the registry default,
//!   an empty registry yields a discard logger
//! - Logging never returns errors to callers

pub mod carrier;
pub mod field;
pub mod handle;
pub mod record;
pub mod registry;
pub mod sink;

pub use carrier::{derive, logger_from, with_logger, ContextLoggerExt};
pub use field::{FieldKey, FieldValue, Fields};
pub use handle::{Event, Logger, LoggerBuilder};
pub use record::{Level, ParseLevelError, Record};
pub use registry::{get_default, is_default_set, set_default, LoggerRegistry};
pub use sink::{DiscardSink, MemorySink, Sink, TracingSink, WriterFormat, WriterSink};
