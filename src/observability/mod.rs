//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Service internals:
//!     → tracing macros → tracing-subscriber (EnvFilter + fmt) → stderr
//!
//! Request records:
//!     → Logger from the request Context → configured sink
//!       (JSON / pretty lines, or forwarded into tracing)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Request ID flows through all subsystems via the Context
//! - Base logger is rebuilt on config reload, never mutated

pub mod logging;
