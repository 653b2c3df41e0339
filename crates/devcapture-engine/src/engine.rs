//! The capture engine
//!
//! [`DevCapture`] is a cheap, cloneable handle to one engine: the sampling
//! decision, the record buffers, the delivery channel, the periodic flush
//! timer and the interceptors the engine owns. Pass it to whatever layer
//! emits telemetry, or use [`crate::global`] where a handle cannot be
//! threaded through.
//!
//! ## Lifecycle
//!
//! ```text
//! builder.build() ── decide sampling once
//!        │
//!        ├── out of sample: NullBeacon, nothing installed, no timer
//!        └── sampled: beacon + interceptors + FlushTimer
//!                 │
//!         capture_* ──→ buffers ──(size | timer | manual | unload | crash)──→ flush
//!                 │
//!            destroy() ── stop timer, uninstall, final flush
//! ```

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use devcapture_core::{
    DiagnosticEvent, NetworkSpan, Payload, Redactor, Sampler, TelemetryConfig, TelemetryError,
};
use tracing::{debug, info, warn};

use crate::buffer::{CriticalSection, RecordBuffer};
use crate::delivery::{Beacon, HttpBeacon, NullBeacon};
use crate::interceptors::Interceptors;
use crate::metrics::CaptureMetrics;
use crate::scheduler::FlushTimer;

// ============================================================================
// FlushTrigger
// ============================================================================

/// Why a flush happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlushTrigger {
    /// Explicit `flush()` call
    Manual,
    /// A stream reached `max_batch_size`
    Size,
    /// Periodic timer tick
    Timer,
    /// Final flush of `destroy()`
    Shutdown,
    /// Process or host is going away
    Unload,
    /// Panic hook
    Crash,
}

impl FlushTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlushTrigger::Manual => "manual",
            FlushTrigger::Size => "size",
            FlushTrigger::Timer => "timer",
            FlushTrigger::Shutdown => "shutdown",
            FlushTrigger::Unload => "unload",
            FlushTrigger::Crash => "crash",
        }
    }
}

impl fmt::Display for FlushTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Engine state
// ============================================================================

pub(crate) struct Inner {
    config: TelemetryConfig,
    sampled: bool,
    redactor: Redactor,
    buffers: Mutex<RecordBuffer>,
    beacon: Arc<dyn Beacon>,
    metrics: Option<Arc<CaptureMetrics>>,
    timer: Mutex<Option<FlushTimer>>,
    interceptors: Interceptors,
    destroyed: AtomicBool,
}

impl Inner {
    fn lock_buffers(&self) -> MutexGuard<'_, RecordBuffer> {
        self.buffers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn drain(&self) -> Option<Payload> {
        let _section = CriticalSection::enter();
        let mut buffers = self.lock_buffers();
        buffers.drain()
    }

    fn deliver(&self, payload: Payload, trigger: FlushTrigger) -> bool {
        let spans = payload.network.len();
        let events = payload.events.len();
        let accepted = self.beacon.send(payload);

        if let Some(metrics) = &self.metrics {
            metrics.record_flush(trigger.as_str(), spans, events);
            if !accepted {
                metrics.record_dropped_payload();
            }
        }

        if accepted {
            debug!(trigger = %trigger, spans, events, "Flushed telemetry payload");
        } else {
            debug!(trigger = %trigger, spans, events, "Delivery channel refused payload, dropped");
        }
        accepted
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        // The last handle went away without destroy(), or a capture raced
        // the final flush. Either way the leftovers still go out.
        if let Some(payload) = self.drain() {
            self.deliver(payload, FlushTrigger::Shutdown);
        }
    }
}

// ============================================================================
// DevCapture
// ============================================================================

/// Handle to a capture engine. Clones share the same engine.
#[derive(Clone)]
pub struct DevCapture {
    inner: Arc<Inner>,
}

impl DevCapture {
    /// Builds an engine from `config` with an entropy-seeded sampler, the
    /// default beacon and every interceptor the config enables.
    pub fn new(config: TelemetryConfig) -> Result<Self, TelemetryError> {
        Self::builder(config).build()
    }

    pub fn builder(config: TelemetryConfig) -> DevCaptureBuilder {
        DevCaptureBuilder::new(config)
    }

    pub(crate) fn from_inner(inner: Arc<Inner>) -> Self {
        Self { inner }
    }

    pub(crate) fn inner(&self) -> &Arc<Inner> {
        &self.inner
    }

    pub(crate) fn downgrade(&self) -> Weak<Inner> {
        Arc::downgrade(&self.inner)
    }

    /// True while the engine records: sampled in and not destroyed.
    fn is_recording(&self) -> bool {
        self.inner.sampled && !self.inner.destroyed.load(Ordering::Acquire)
    }

    // ========================================================================
    // Capture
    // ========================================================================

    /// Buffer an observed network call.
    ///
    /// The span's URL is scrubbed before it is stored. Flushes immediately
    /// if the network stream reached `max_batch_size`. Does nothing when the
    /// engine is out of sample or destroyed.
    pub fn capture_network(&self, mut span: NetworkSpan) {
        if !self.is_recording() {
            return;
        }
        span.url = self.inner.redactor.scrub_url(&span.url);

        let full = {
            let _section = CriticalSection::enter();
            let mut buffers = self.inner.lock_buffers();
            buffers.push_network(span)
        };
        if let Some(metrics) = &self.inner.metrics {
            metrics.record_capture("network");
        }
        if full {
            self.flush_with(FlushTrigger::Size);
        }
    }

    /// Buffer a diagnostic event.
    ///
    /// Flushes immediately if the event stream reached `max_batch_size`.
    /// Does nothing when the engine is out of sample or destroyed.
    pub fn capture_event(&self, event: DiagnosticEvent) {
        if !self.is_recording() {
            return;
        }

        let full = {
            let _section = CriticalSection::enter();
            let mut buffers = self.inner.lock_buffers();
            buffers.push_event(event)
        };
        if let Some(metrics) = &self.inner.metrics {
            metrics.record_capture("events");
        }
        if full {
            self.flush_with(FlushTrigger::Size);
        }
    }

    // ========================================================================
    // Flush
    // ========================================================================

    /// Send everything buffered as one payload.
    ///
    /// Returns true if a payload was handed to the delivery channel and
    /// accepted; false if there was nothing to send or it was refused.
    pub fn flush(&self) -> bool {
        self.flush_with(FlushTrigger::Manual)
    }

    /// [`flush`](Self::flush) attributed to `trigger`.
    ///
    /// Both streams are drained under one lock. Records captured while the
    /// payload is being delivered belong to the next flush.
    pub fn flush_with(&self, trigger: FlushTrigger) -> bool {
        match self.inner.drain() {
            Some(payload) => self.inner.deliver(payload, trigger),
            None => false,
        }
    }

    /// Best-effort flush for a host that is about to go away.
    pub fn notify_unload(&self) -> bool {
        self.flush_with(FlushTrigger::Unload)
    }

    // ========================================================================
    // Teardown
    // ========================================================================

    /// Stop the timer, release the interceptors and flush one last time.
    ///
    /// Idempotent: only the first call does anything. Captures after this
    /// are ignored.
    pub fn destroy(&self) {
        if self.inner.destroyed.swap(true, Ordering::AcqRel) {
            return;
        }

        let timer = self
            .inner
            .timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(timer) = timer {
            timer.stop();
        }

        self.inner.interceptors.uninstall(&self.inner);
        self.flush_with(FlushTrigger::Shutdown);

        info!("Capture engine destroyed");
    }

    /// [`destroy`](Self::destroy), then give the delivery channel up to
    /// `grace` to send what it still holds.
    pub async fn shutdown(&self, grace: Duration) {
        self.destroy();
        self.inner.beacon.drain(grace).await;
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// The session sampling decision, fixed at construction.
    pub fn is_sampled(&self) -> bool {
        self.inner.sampled
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.destroyed.load(Ordering::Acquire)
    }

    pub fn config(&self) -> &TelemetryConfig {
        &self.inner.config
    }

    pub fn redactor(&self) -> &Redactor {
        &self.inner.redactor
    }

    pub fn metrics(&self) -> Option<&Arc<CaptureMetrics>> {
        self.inner.metrics.as_ref()
    }

    /// Buffered `(spans, events)` counts.
    pub fn buffered(&self) -> (usize, usize) {
        let _section = CriticalSection::enter();
        let buffers = self.inner.lock_buffers();
        buffers.len()
    }

    /// Returns true if the periodic flush timer is running.
    pub fn has_timer(&self) -> bool {
        self.inner
            .timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|timer| !timer.is_finished())
    }

    /// Returns true if both handles refer to the same engine.
    pub fn same_engine(&self, other: &DevCapture) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for DevCapture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DevCapture")
            .field("sampled", &self.inner.sampled)
            .field("destroyed", &self.is_destroyed())
            .field("buffered", &self.buffered())
            .finish()
    }
}

// ============================================================================
// DevCaptureBuilder
// ============================================================================

/// Builder for [`DevCapture`].
pub struct DevCaptureBuilder {
    config: TelemetryConfig,
    sampler: Option<Sampler>,
    beacon: Option<Arc<dyn Beacon>>,
    install_interceptors: bool,
    metrics: Option<Arc<CaptureMetrics>>,
}

impl DevCaptureBuilder {
    pub fn new(config: TelemetryConfig) -> Self {
        Self {
            config,
            sampler: None,
            beacon: None,
            install_interceptors: true,
            metrics: None,
        }
    }

    /// Random source for the sampling decision (entropy-seeded by default).
    pub fn sampler(mut self, sampler: Sampler) -> Self {
        self.sampler = Some(sampler);
        self
    }

    /// Delivery channel. Defaults to an [`HttpBeacon`] built from the
    /// config when sampled in, a [`NullBeacon`] otherwise.
    pub fn beacon(mut self, beacon: Arc<dyn Beacon>) -> Self {
        self.beacon = Some(beacon);
        self
    }

    /// Whether to take ownership of the process-wide interceptors enabled
    /// in the config (default true). Without them the engine only records
    /// what is passed to `capture_*` explicitly.
    pub fn install_interceptors(mut self, install: bool) -> Self {
        self.install_interceptors = install;
        self
    }

    pub fn metrics(mut self, metrics: Arc<CaptureMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Validates the config, decides sampling and starts the engine.
    ///
    /// The periodic timer needs a tokio runtime; without one the engine
    /// still flushes on size, on demand and on destroy.
    pub fn build(self) -> Result<DevCapture, TelemetryError> {
        let errors = self.config.validate();
        if !errors.is_empty() {
            return Err(TelemetryError::InvalidConfig(errors));
        }

        let mut sampler = self.sampler.unwrap_or_default();
        let sampled = sampler.decide(self.config.sampling_rate);

        let beacon: Arc<dyn Beacon> = match self.beacon {
            Some(beacon) => beacon,
            None if sampled => Arc::new(HttpBeacon::from_config(&self.config)?),
            None => Arc::new(NullBeacon),
        };

        let interceptors = if sampled && self.install_interceptors {
            Interceptors::from_toggles(&self.config.capture)
        } else {
            Interceptors::none()
        };

        let inner = Arc::new(Inner {
            redactor: Redactor::new(&self.config),
            buffers: Mutex::new(RecordBuffer::new(self.config.max_batch_size)),
            sampled,
            beacon,
            metrics: self.metrics,
            timer: Mutex::new(None),
            interceptors,
            destroyed: AtomicBool::new(false),
            config: self.config,
        });

        if sampled {
            inner.interceptors.install(&inner);
            start_timer(&inner);
        }

        info!(
            sampled,
            sampling_rate = inner.config.sampling_rate,
            "Capture engine initialized"
        );

        Ok(DevCapture::from_inner(inner))
    }
}

/// Starts the periodic flush on the current runtime, if there is one.
fn start_timer(inner: &Arc<Inner>) {
    let runtime = match tokio::runtime::Handle::try_current() {
        Ok(runtime) => runtime,
        Err(e) => {
            warn!(error = %e, "No tokio runtime, periodic flush disabled");
            return;
        }
    };

    let engine = Arc::downgrade(inner);
    let timer = FlushTimer::start(&runtime, inner.config.flush_interval(), move || {
        match engine.upgrade() {
            Some(inner) => {
                DevCapture::from_inner(inner).flush_with(FlushTrigger::Timer);
                true
            }
            None => false,
        }
    });

    *inner.timer.lock().unwrap_or_else(PoisonError::into_inner) = Some(timer);
}
