//! # Error Types
//!
//! This module defines error types used throughout the dotmate library.
//!
//! Errors raised while a schedule fires (validation, external data, transport)
//! are caught and logged by the schedule engine. Cron errors abort startup.
//! Manual pushes hand every error back to the caller.

use thiserror::Error;

use crate::providers::ProviderError;
use crate::transport::TransportError;

/// Main error type for dotmate operations
#[derive(Debug, Error)]
pub enum DotmateError {
    /// A schedule's cron expression could not be parsed (fatal at load)
    #[error("Invalid cron expression for {spec}: {reason}")]
    InvalidCronExpression { spec: String, reason: String },

    /// No renderer registered under this type name
    #[error("Unknown renderer kind: {0}")]
    UnknownRendererKind(String),

    /// Parameters do not satisfy the renderer's contract
    #[error("Invalid parameters for {kind}: {reason}")]
    ParameterValidationFailed { kind: String, reason: String },

    /// A third-party data provider could not be reached or refused the request
    #[error("External data unavailable from {provider}: {source}")]
    ExternalDataUnavailable {
        provider: &'static str,
        #[source]
        source: ProviderError,
    },

    /// Delivery to the device failed
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Configuration file missing or malformed
    #[error("Config error: {0}")]
    Config(String),

    /// Image decoding or encoding error
    #[error("Image error: {0}")]
    Image(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DotmateError {
    /// Shorthand for a parameter validation failure.
    pub fn invalid_params(kind: &str, reason: impl Into<String>) -> Self {
        DotmateError::ParameterValidationFailed {
            kind: kind.to_string(),
            reason: reason.into(),
        }
    }
}
