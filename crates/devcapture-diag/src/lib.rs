//! DevCapture Diag - client for the DevDiag diagnostics service
//!
//! Provides async access to:
//! - `GET /healthz` - service liveness and version
//! - `GET /probes` - available probe presets
//! - `POST /diag/run` - run a probe preset against a URL
//!
//! Requests go through a [`TracedClient`](devcapture_engine::TracedClient),
//! so when a capture engine owns the network interceptor the client's own
//! calls show up in its telemetry.
//!
//! ## Modules
//!
//! - [`client`] - the HTTP client
//! - [`types`] - request and response bodies

pub mod client;
pub mod types;

use reqwest::StatusCode;
use thiserror::Error;

pub use client::DiagnosticsClient;
pub use types::{DiagRequest, DiagResponse, DiagResult, Health, Preset, PresetList, Severity};

/// Errors returned by [`DiagnosticsClient`]
#[derive(Debug, Error)]
pub enum DiagError {
    /// The service answered with a non-success status
    #[error("DevDiag API error ({status}): {detail}")]
    Api {
        /// HTTP status of the response
        status: StatusCode,
        /// Server-provided `detail`, or the status reason text
        detail: String,
    },

    /// The request did not produce a response
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A success response whose body could not be parsed
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl DiagError {
    /// HTTP status of an API error, if this is one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            DiagError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}
