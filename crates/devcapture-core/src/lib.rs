//! DevCapture Core - configuration and record model for client-side telemetry
//!
//! This crate holds everything the capture engine needs that does not touch
//! a runtime:
//! - **Configuration** - `TelemetryConfig`, partial YAML overrides, validation, builder
//! - **Records** - `NetworkSpan`, `DiagnosticEvent`, `Payload`
//! - **Redactor** - query-parameter masking and header dropping
//! - **Sampler** - the once-per-session sampling decision
//!
//! The engine crate (`devcapture-engine`) wires these into buffers,
//! interceptors and delivery.

pub mod config;
pub mod domain;
pub mod redact;
pub mod sampler;

pub use config::{CaptureToggles, ConfigBuilder, TelemetryConfig, ValidationError};
pub use domain::{DiagnosticEvent, Level, NetworkSpan, Payload, TelemetryError};
pub use redact::Redactor;
pub use sampler::Sampler;
