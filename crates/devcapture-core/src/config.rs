//! Configuration module for DevCapture.
//!
//! Provides the typed capture configuration that maps to the YAML
//! configuration file, with loading, validation, defaults, and a builder
//! for programmatic partial overrides.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// TelemetryConfig
// ---------------------------------------------------------------------------

/// Default session sampling rate (2% of sessions).
pub const DEFAULT_SAMPLING_RATE: f64 = 0.02;

/// Default collection endpoint, resolved against `origin` when relative.
pub const DEFAULT_ENDPOINT: &str = "/api/telemetry";

/// Query parameters masked by default.
pub const DEFAULT_REDACT_PARAMS: &[&str] = &["token", "key", "code", "session"];

/// Headers dropped by default.
pub const DEFAULT_REDACT_HEADERS: &[&str] = &["authorization", "cookie", "x-api-key"];

/// Top-level capture configuration.
///
/// Every field carries a default, so a YAML file (or a [`ConfigBuilder`])
/// only needs to name the values it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Fraction of sessions that capture anything, in `[0, 1]`.
    pub sampling_rate: f64,
    /// Collection endpoint. Relative paths are joined onto `origin`.
    pub endpoint: String,
    /// Base URL used to resolve relative request URLs and the endpoint.
    pub origin: Option<String>,
    /// Query-parameter names whose values are replaced with `[REDACTED]`.
    pub redact_params: Vec<String>,
    /// Header names (case-insensitive) that are dropped before buffering.
    pub redact_headers: Vec<String>,
    /// Records per stream that force an immediate flush.
    pub max_batch_size: usize,
    /// Milliseconds between periodic flushes.
    pub flush_interval_ms: u64,
    /// Payloads that may wait in the delivery queue before new ones are dropped.
    pub queue_capacity: usize,
    /// Bearer credential forwarded to the collection endpoint.
    pub auth_token: Option<String>,
    /// Which observation sources are installed for a sampled session.
    pub capture: CaptureToggles,
}

/// Per-source switches for the interceptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureToggles {
    pub network: bool,
    pub logs: bool,
    pub panics: bool,
    pub rejections: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            sampling_rate: DEFAULT_SAMPLING_RATE,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            origin: None,
            redact_params: DEFAULT_REDACT_PARAMS.iter().map(|s| s.to_string()).collect(),
            redact_headers: DEFAULT_REDACT_HEADERS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_batch_size: 50,
            flush_interval_ms: 5000,
            queue_capacity: 64,
            auth_token: None,
            capture: CaptureToggles::default(),
        }
    }
}

impl Default for CaptureToggles {
    fn default() -> Self {
        Self {
            network: true,
            logs: true,
            panics: true,
            rejections: true,
        }
    }
}

impl TelemetryConfig {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: TelemetryConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`TelemetryConfig::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/devcapture/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("devcapture")
            .join("config.yaml")
    }

    /// Flush interval as a [`std::time::Duration`].
    pub fn flush_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.flush_interval_ms)
    }

    /// Absolute endpoint URL, joining a relative `endpoint` onto `origin`.
    ///
    /// Returns `None` when the endpoint is relative and no origin is set,
    /// or when either value fails to parse.
    pub fn resolved_endpoint(&self) -> Option<url::Url> {
        match url::Url::parse(&self.endpoint) {
            Ok(url) => Some(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let origin = url::Url::parse(self.origin.as_deref()?).ok()?;
                origin.join(&self.endpoint).ok()
            }
            Err(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Name of the offending field, e.g. `"max_batch_size"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl TelemetryConfig {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if !(0.0..=1.0).contains(&self.sampling_rate) {
            errors.push(ValidationError {
                field: "sampling_rate".into(),
                message: format!("must be in range 0.0..=1.0, got {}", self.sampling_rate),
            });
        }
        let origin_ok = match &self.origin {
            Some(origin) if url::Url::parse(origin).is_err() => {
                errors.push(ValidationError {
                    field: "origin".into(),
                    message: format!("not an absolute URL: {origin}"),
                });
                false
            }
            _ => true,
        };
        if self.endpoint.trim().is_empty() {
            errors.push(ValidationError {
                field: "endpoint".into(),
                message: "must not be empty".into(),
            });
        } else if origin_ok && self.resolved_endpoint().is_none() {
            errors.push(ValidationError {
                field: "endpoint".into(),
                message: format!(
                    "cannot resolve '{}' (use an absolute URL or set an origin)",
                    self.endpoint
                ),
            });
        }
        if self.max_batch_size == 0 {
            errors.push(ValidationError {
                field: "max_batch_size".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.flush_interval_ms == 0 {
            errors.push(ValidationError {
                field: "flush_interval_ms".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.queue_capacity == 0 {
            errors.push(ValidationError {
                field: "queue_capacity".into(),
                message: "must be greater than 0".into(),
            });
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`TelemetryConfig`] programmatically.
///
/// Starts from [`TelemetryConfig::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust
/// use devcapture_core::config::ConfigBuilder;
///
/// let config = ConfigBuilder::new()
///     .sampling_rate(1.0)
///     .endpoint("https://collector.example.com/api/telemetry")
///     .max_batch_size(10)
///     .build();
/// assert_eq!(config.flush_interval_ms, 5000);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: TelemetryConfig,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`TelemetryConfig::default`] values.
    pub fn new() -> Self {
        Self {
            config: TelemetryConfig::default(),
        }
    }

    pub fn sampling_rate(mut self, rate: f64) -> Self {
        self.config.sampling_rate = rate;
        self
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint = endpoint.into();
        self
    }

    pub fn origin(mut self, origin: impl Into<String>) -> Self {
        self.config.origin = Some(origin.into());
        self
    }

    pub fn redact_params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.redact_params = params.into_iter().map(Into::into).collect();
        self
    }

    pub fn redact_headers<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.redact_headers = headers.into_iter().map(Into::into).collect();
        self
    }

    pub fn max_batch_size(mut self, n: usize) -> Self {
        self.config.max_batch_size = n;
        self
    }

    pub fn flush_interval_ms(mut self, ms: u64) -> Self {
        self.config.flush_interval_ms = ms;
        self
    }

    pub fn queue_capacity(mut self, n: usize) -> Self {
        self.config.queue_capacity = n;
        self
    }

    pub fn auth_token(mut self, token: impl Into<String>) -> Self {
        self.config.auth_token = Some(token.into());
        self
    }

    pub fn capture(mut self, toggles: CaptureToggles) -> Self {
        self.config.capture = toggles;
        self
    }

    /// Consume the builder and return the finished [`TelemetryConfig`].
    pub fn build(self) -> TelemetryConfig {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<TelemetryConfig, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
