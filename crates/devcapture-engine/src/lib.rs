//! DevCapture Engine - sampled client-side telemetry capture
//!
//! Provides:
//! - `DevCapture`: the capture engine handle (buffers, flush, lifecycle)
//! - `FlushTimer`: periodic flush driven by a tokio interval
//! - `Beacon` / `HttpBeacon`: fire-and-forget delivery to the collection endpoint
//! - Interceptors: `TracedClient` (HTTP calls), `ErrorLogLayer` (error logs),
//!   a chained panic hook, and `spawn_observed` (unobserved task failures)
//! - `global`: optional process-wide instance with replace-tears-down semantics
//! - `CaptureMetrics`: Prometheus counters for the engine itself
//!
//! ## Flow
//!
//! ```text
//! interceptors ──→ DevCapture::capture_* ──→ RecordBuffer
//!                                               │ (size / timer / destroy / unload / crash)
//!                                               ▼
//!                                         flush ──→ Beacon::send ──→ queue ──→ worker POST
//! ```

pub mod buffer;
pub mod delivery;
pub mod engine;
pub mod global;
pub mod interceptors;
pub mod metrics;
pub mod scheduler;
pub mod unload;

pub use delivery::{Beacon, HttpBeacon, MemoryBeacon, NullBeacon, ReqwestTransport, Transport};
pub use engine::{DevCapture, DevCaptureBuilder, FlushTrigger};
pub use interceptors::log::ErrorLogLayer;
pub use interceptors::network::{
    observe_call, ResponseStatus, TracedClient, TracedRequestBuilder, ABORTED_MESSAGE,
};
pub use interceptors::rejection::{report_rejection, spawn_observed};
pub use interceptors::InterceptorKind;
pub use metrics::CaptureMetrics;
pub use scheduler::FlushTimer;
pub use unload::{flush_on_cancel, shutdown_signal};

pub use devcapture_core::{
    CaptureToggles, ConfigBuilder, DiagnosticEvent, Level, NetworkSpan, Payload, Redactor,
    Sampler, TelemetryConfig, TelemetryError,
};
