//! Fire-and-forget delivery of flushed payloads
//!
//! A [`Beacon`] accepts a payload without blocking and without reporting
//! whether it ever reached the collector. [`HttpBeacon`] serializes the
//! payload immediately, parks the body in a bounded queue, and lets a
//! background worker POST it. A full queue drops the payload; a failed POST
//! is logged at debug level and dropped. Nothing is retried.
//!
//! ```text
//! flush ──→ HttpBeacon::send ──try_send──→ mpsc (bounded) ──→ worker ──→ Transport::post
//! ```

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use devcapture_core::{Payload, TelemetryConfig, TelemetryError};
use reqwest::header::CONTENT_TYPE;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

/// Timeout applied to each delivery POST.
const DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);

// ============================================================================
// Beacon
// ============================================================================

/// One-way payload sender.
#[async_trait]
pub trait Beacon: Send + Sync {
    /// Hand a payload off for delivery. Never blocks.
    ///
    /// Returns true if the payload was accepted (queued), not whether it
    /// was delivered.
    fn send(&self, payload: Payload) -> bool;

    /// Stop accepting payloads and give in-flight ones up to `grace` to go out.
    async fn drain(&self, _grace: Duration) {}
}

/// Beacon used by out-of-sample engines. Accepts and discards everything.
#[derive(Debug, Default)]
pub struct NullBeacon;

#[async_trait]
impl Beacon for NullBeacon {
    fn send(&self, _payload: Payload) -> bool {
        true
    }
}

/// In-memory beacon that records every payload it accepts.
///
/// Useful for tests and for embedding applications that ship telemetry
/// through their own channel.
#[derive(Debug, Default)]
pub struct MemoryBeacon {
    payloads: Mutex<Vec<Payload>>,
    reject: std::sync::atomic::AtomicBool,
}

impl MemoryBeacon {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent `send` calls refuse payloads, as a full queue would.
    pub fn set_rejecting(&self, reject: bool) {
        self.reject
            .store(reject, std::sync::atomic::Ordering::SeqCst);
    }

    /// Snapshot of every accepted payload, oldest first.
    pub fn payloads(&self) -> Vec<Payload> {
        self.payloads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of accepted payloads.
    pub fn count(&self) -> usize {
        self.payloads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[async_trait]
impl Beacon for MemoryBeacon {
    fn send(&self, payload: Payload) -> bool {
        if self.reject.load(std::sync::atomic::Ordering::SeqCst) {
            return false;
        }
        self.payloads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(payload);
        true
    }
}

// ============================================================================
// Transport
// ============================================================================

/// Sends one serialized payload body to the collection endpoint.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post(&self, endpoint: &Url, body: Vec<u8>) -> anyhow::Result<()>;
}

/// Production transport backed by a plain `reqwest::Client`.
///
/// The client is deliberately not a `TracedClient`: delivery traffic must
/// never be captured as telemetry itself.
pub struct ReqwestTransport {
    client: reqwest::Client,
    auth_token: Option<String>,
}

impl ReqwestTransport {
    /// Creates a transport that forwards `auth_token` as a bearer credential.
    pub fn new(auth_token: Option<String>) -> Result<Self, TelemetryError> {
        let client = reqwest::Client::builder()
            .timeout(DELIVERY_TIMEOUT)
            .build()?;
        Ok(Self { client, auth_token })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn post(&self, endpoint: &Url, body: Vec<u8>) -> anyhow::Result<()> {
        let mut request = self
            .client
            .post(endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(body);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        debug!(status = %response.status(), "Collector acknowledged payload");
        Ok(())
    }
}

// ============================================================================
// HttpBeacon
// ============================================================================

/// Queue-backed beacon with a background delivery worker.
pub struct HttpBeacon {
    queue: Mutex<Option<mpsc::Sender<Vec<u8>>>>,
    worker: tokio::sync::Mutex<Option<JoinHandle<()>>>,
    endpoint: Url,
}

impl HttpBeacon {
    /// Builds the production beacon from configuration.
    ///
    /// Resolves the endpoint against `origin`, creates a
    /// [`ReqwestTransport`] carrying `auth_token`, and spawns the worker on
    /// the current tokio runtime.
    pub fn from_config(config: &TelemetryConfig) -> Result<Self, TelemetryError> {
        let endpoint = config
            .resolved_endpoint()
            .ok_or_else(|| TelemetryError::InvalidEndpoint(config.endpoint.clone()))?;
        let transport = ReqwestTransport::new(config.auth_token.clone())?;
        Self::spawn(endpoint, Arc::new(transport), config.queue_capacity)
    }

    /// Spawns the delivery worker on the current tokio runtime.
    ///
    /// # Arguments
    /// * `endpoint` - Absolute collector URL
    /// * `transport` - How each body is sent
    /// * `capacity` - Payloads that may wait before new ones are dropped
    pub fn spawn(
        endpoint: Url,
        transport: Arc<dyn Transport>,
        capacity: usize,
    ) -> Result<Self, TelemetryError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| TelemetryError::NoRuntime(format!("delivery worker: {e}")))?;

        let (tx, rx) = mpsc::channel(capacity.max(1));
        let worker = runtime.spawn(run_worker(rx, endpoint.clone(), transport));

        info!(endpoint = %endpoint, capacity, "Telemetry delivery worker started");

        Ok(Self {
            queue: Mutex::new(Some(tx)),
            worker: tokio::sync::Mutex::new(Some(worker)),
            endpoint,
        })
    }

    /// The absolute collector URL payloads are sent to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl Beacon for HttpBeacon {
    fn send(&self, payload: Payload) -> bool {
        let body = match payload.to_json_bytes() {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, "Failed to serialize telemetry payload");
                return false;
            }
        };

        let queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
        match queue.as_ref() {
            Some(tx) => tx.try_send(body).is_ok(),
            None => false,
        }
    }

    async fn drain(&self, grace: Duration) {
        // Dropping the sender lets the worker finish the backlog and exit.
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        let Some(worker) = self.worker.lock().await.take() else {
            return;
        };
        if tokio::time::timeout(grace, worker).await.is_err() {
            debug!(
                grace_ms = grace.as_millis() as u64,
                "Delivery backlog not drained within grace period"
            );
        }
    }
}

async fn run_worker(mut rx: mpsc::Receiver<Vec<u8>>, endpoint: Url, transport: Arc<dyn Transport>) {
    while let Some(body) = rx.recv().await {
        let bytes = body.len();
        match transport.post(&endpoint, body).await {
            Ok(()) => debug!(bytes, "Telemetry payload delivered"),
            Err(e) => debug!(bytes, error = %e, "Telemetry delivery failed, payload dropped"),
        }
    }
    debug!("Telemetry delivery worker stopped");
}
