//! DevDiag HTTP client
//!
//! ## Usage
//!
//! ```rust,no_run
//! use devcapture_diag::{DiagRequest, DiagnosticsClient, Preset};
//!
//! # async fn example() -> Result<(), devcapture_diag::DiagError> {
//! let client = DiagnosticsClient::new("https://diag.example.com", Some("reader-jwt".into()));
//! let response = client
//!     .run(&DiagRequest::new("https://app.example.com/chat").preset(Preset::Chat))
//!     .await?;
//! for problem in &response.result.problems {
//!     println!("{problem}");
//! }
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use devcapture_engine::{TracedClient, TracedRequestBuilder};
use reqwest::{Method, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::types::{DiagRequest, DiagResponse, Health, PresetList};
use crate::DiagError;

/// Per-request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// `POST /diag/run` can take much longer: the service drives a browser.
const RUN_TIMEOUT: Duration = Duration::from_secs(180);

/// Error body returned by the service on non-success responses
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
}

/// HTTP client for the DevDiag service
///
/// Wraps a [`TracedClient`] with bearer authentication and base URL
/// construction.
#[derive(Debug, Clone)]
pub struct DiagnosticsClient {
    /// The underlying HTTP client
    client: TracedClient,
    /// Service root, without a trailing slash
    base_url: String,
    /// Optional bearer token (JWT)
    token: Option<String>,
}

impl DiagnosticsClient {
    /// Creates a client for the service at `base_url`
    ///
    /// # Arguments
    /// * `base_url` - Service root, e.g. `https://diag.example.com`
    /// * `token` - Bearer token, required when the service verifies JWTs
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        Self::with_client(TracedClient::default(), base_url, token)
    }

    /// Creates a client on top of an existing [`TracedClient`]
    ///
    /// # Arguments
    /// * `client` - HTTP client to send requests with
    /// * `base_url` - Service root
    /// * `token` - Bearer token
    pub fn with_client(
        client: TracedClient,
        base_url: impl Into<String>,
        token: Option<String>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            token,
        }
    }

    /// Returns the service root
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Creates a request builder for `path`, authenticated when a token is set
    ///
    /// # Arguments
    /// * `method` - HTTP method
    /// * `path` - Path relative to the base URL (e.g. `/healthz`)
    fn request(&self, method: Method, path: &str) -> TracedRequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let builder = self.client.request(method, &url).timeout(REQUEST_TIMEOUT);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Checks service liveness (`GET /healthz`)
    pub async fn health(&self) -> Result<Health, DiagError> {
        debug!("Checking DevDiag health");
        let response = self.request(Method::GET, "/healthz").send().await?;
        parse(response).await
    }

    /// Lists the probe presets the service accepts (`GET /probes`)
    pub async fn presets(&self) -> Result<PresetList, DiagError> {
        debug!("Fetching DevDiag presets");
        let response = self.request(Method::GET, "/probes").send().await?;
        parse(response).await
    }

    /// Runs diagnostics against a URL (`POST /diag/run`)
    ///
    /// An unset preset is sent as `app`.
    ///
    /// # Arguments
    /// * `request` - Target URL and probe options
    pub async fn run(&self, request: &DiagRequest) -> Result<DiagResponse, DiagError> {
        let body = DiagRequest {
            preset: Some(request.preset.unwrap_or_default()),
            ..request.clone()
        };
        debug!(url = %body.url, preset = ?body.preset, "Running DevDiag diagnostics");

        let response = self
            .request(Method::POST, "/diag/run")
            .timeout(RUN_TIMEOUT)
            .json(&body)
            .send()
            .await?;
        parse(response).await
    }
}

/// Turns a response into `T`, or into [`DiagError::Api`] for non-success
/// statuses.
async fn parse<T: DeserializeOwned>(response: Response) -> Result<T, DiagError> {
    let status = response.status();
    let body = response.bytes().await?;

    if !status.is_success() {
        let detail = error_detail(&body)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown error").to_string());
        debug!(status = %status, detail = %detail, "DevDiag request failed");
        return Err(DiagError::Api { status, detail });
    }

    serde_json::from_slice(&body).map_err(|e| DiagError::InvalidResponse(e.to_string()))
}

/// The server-provided `detail`, rendered as text.
fn error_detail(body: &[u8]) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_slice(body).ok()?;
    match parsed.detail? {
        serde_json::Value::String(s) if !s.is_empty() => Some(s),
        serde_json::Value::String(_) | serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}
