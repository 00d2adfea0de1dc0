//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Check logging settings (known level, usable field name)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::ServiceConfig;
use crate::logger::Level;

/// Longest accepted request timeout (one day).
pub const MAX_REQUEST_SECS: u64 = 24 * 60 * 60;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid bind address: {0}")]
    BindAddress(String),

    #[error("timeouts.request_secs must be greater than 0")]
    ZeroRequestTimeout,

    #[error("timeouts.request_secs must be at most {MAX_REQUEST_SECS}, got {0}")]
    RequestTimeoutTooLarge(u64),

    #[error("invalid log level: {0}")]
    LogLevel(String),

    #[error("logging.request_id_field must not be empty")]
    EmptyRequestIdField,

    #[error("static field {0} collides with logging.request_id_field")]
    StaticFieldCollision(String),
}

/// Validate a parsed configuration.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    match config.timeouts.request_secs {
        0 => errors.push(ValidationError::ZeroRequestTimeout),
        secs if secs > MAX_REQUEST_SECS => {
            errors.push(ValidationError::RequestTimeoutTooLarge(secs))
        }
        _ => {}
    }

    if config.logging.level.parse::<Level>().is_err() {
        errors.push(ValidationError::LogLevel(config.logging.level.clone()));
    }

    let field = config.logging.request_id_field.trim();
    if field.is_empty() {
        errors.push(ValidationError::EmptyRequestIdField);
    } else if config.logging.static_fields.contains_key(field) {
        errors.push(ValidationError::StaticFieldCollision(field.to_string()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
