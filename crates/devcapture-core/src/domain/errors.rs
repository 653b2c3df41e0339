//! Capture error types
//!
//! Errors surface only at construction and configuration boundaries.
//! Nothing on the capture path returns one of these: capture failures are
//! swallowed so the observed operation is never affected.

use thiserror::Error;

use crate::config::ValidationError;

/// Errors that can occur while building or configuring a capture engine
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The configuration failed validation
    #[error("Invalid configuration: {}", join_errors(.0))]
    InvalidConfig(Vec<ValidationError>),

    /// The collection endpoint could not be resolved to an absolute URL
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// A component that spawns background work was built outside a tokio runtime
    #[error("No tokio runtime available: {0}")]
    NoRuntime(String),

    /// A payload could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The HTTP transport could not be constructed
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
