//! Record types and errors
//!
//! This module contains the canonical shapes every observation source
//! normalizes into:
//! - `NetworkSpan` for one observed outbound call
//! - `DiagnosticEvent` for log records and uncaught failures
//! - `Payload`, the unit handed to the delivery channel on each flush
//! - Crate-level error types

pub mod errors;
pub mod records;

pub use errors::TelemetryError;
pub use records::{now_millis, DiagnosticEvent, Level, NetworkSpan, Payload};
