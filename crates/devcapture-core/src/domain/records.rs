//! Canonical telemetry records
//!
//! Field names serialize in camelCase to match the collection endpoint's
//! wire format: `{ "network": [...], "events": [...] }`.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Milliseconds since the Unix epoch, used for every record timestamp.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

// ============================================================================
// NetworkSpan
// ============================================================================

/// One observed outbound network call.
///
/// For a completed call exactly one of `status` or `error` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSpan {
    /// Capture time (epoch millis), taken when the call concluded
    pub timestamp: i64,
    /// HTTP method, e.g. `GET`
    pub method: String,
    /// Request URL with sensitive query values masked
    pub url: String,
    /// Response status code, when a response arrived
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Elapsed wall-clock time in whole milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    /// Failure message, when the call did not produce a response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl NetworkSpan {
    /// Span for a call that produced a response.
    pub fn completed(
        method: impl Into<String>,
        url: impl Into<String>,
        status: u16,
        latency_ms: u64,
    ) -> Self {
        Self {
            timestamp: now_millis(),
            method: method.into(),
            url: url.into(),
            status: Some(status),
            latency_ms: Some(latency_ms),
            error: None,
        }
    }

    /// Span for a call that failed before producing a response.
    pub fn failed(
        method: impl Into<String>,
        url: impl Into<String>,
        latency_ms: u64,
        error: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: now_millis(),
            method: method.into(),
            url: url.into(),
            status: None,
            latency_ms: Some(latency_ms),
            error: Some(error.into()),
        }
    }

    /// Returns true if the observed call failed.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

// ============================================================================
// DiagnosticEvent
// ============================================================================

/// Severity of a diagnostic event. Ordered `Debug < Info < Warn < Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
        };
        f.write_str(s)
    }
}

/// A free-form diagnostic record: a log line, an uncaught panic, or an
/// unobserved task failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticEvent {
    pub timestamp: i64,
    pub level: Level,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Map<String, Value>>,
}

impl DiagnosticEvent {
    /// Create an event stamped with the current time.
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            timestamp: now_millis(),
            level,
            message: message.into(),
            context: None,
        }
    }

    /// Shorthand for an `error`-level event.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Level::Error, message)
    }

    /// Attach a context entry, creating the map on first use.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }
}

// ============================================================================
// Payload
// ============================================================================

/// Everything drained by one flush, in capture order per stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    pub network: Vec<NetworkSpan>,
    pub events: Vec<DiagnosticEvent>,
}

impl Payload {
    pub fn is_empty(&self) -> bool {
        self.network.is_empty() && self.events.is_empty()
    }

    /// Total number of records across both streams.
    pub fn len(&self) -> usize {
        self.network.len() + self.events.len()
    }

    /// Serialize to the JSON body sent to the collection endpoint.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}
