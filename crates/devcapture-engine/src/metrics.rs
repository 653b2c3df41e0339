//! Prometheus metrics for the capture engine itself
//!
//! Counts what the engine captured, how often and why it flushed, and how
//! many payloads the delivery channel refused.

use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

/// Central metrics registry for one or more capture engines.
pub struct CaptureMetrics {
    registry: Registry,
    /// Counter: records appended to a buffer, by stream (network, events)
    pub records_captured_total: IntCounterVec,
    /// Counter: records handed to the delivery channel, by stream
    pub records_flushed_total: IntCounterVec,
    /// Counter: non-empty flushes by trigger (manual, size, timer, ...)
    pub flushes_total: IntCounterVec,
    /// Counter: payloads the delivery channel refused
    pub payloads_dropped_total: IntCounter,
}

impl CaptureMetrics {
    /// Creates a new `CaptureMetrics` with all metrics registered.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new_custom(Some("devcapture".to_string()), None)?;

        let records_captured_total = IntCounterVec::new(
            Opts::new("records_captured_total", "Records appended to a capture buffer"),
            &["stream"],
        )?;
        registry.register(Box::new(records_captured_total.clone()))?;

        let records_flushed_total = IntCounterVec::new(
            Opts::new(
                "records_flushed_total",
                "Records handed to the delivery channel",
            ),
            &["stream"],
        )?;
        registry.register(Box::new(records_flushed_total.clone()))?;

        let flushes_total = IntCounterVec::new(
            Opts::new("flushes_total", "Non-empty flushes by trigger"),
            &["trigger"],
        )?;
        registry.register(Box::new(flushes_total.clone()))?;

        let payloads_dropped_total = IntCounter::with_opts(Opts::new(
            "payloads_dropped_total",
            "Payloads refused by the delivery channel",
        ))?;
        registry.register(Box::new(payloads_dropped_total.clone()))?;

        Ok(Self {
            registry,
            records_captured_total,
            records_flushed_total,
            flushes_total,
            payloads_dropped_total,
        })
    }

    // ========================================================================
    // Recording helpers
    // ========================================================================

    /// Record one captured record on `stream`.
    pub fn record_capture(&self, stream: &str) {
        self.records_captured_total
            .with_label_values(&[stream])
            .inc();
    }

    /// Record a flush and the number of records it carried per stream.
    pub fn record_flush(&self, trigger: &str, spans: usize, events: usize) {
        self.flushes_total.with_label_values(&[trigger]).inc();
        self.records_flushed_total
            .with_label_values(&["network"])
            .inc_by(spans as u64);
        self.records_flushed_total
            .with_label_values(&["events"])
            .inc_by(events as u64);
    }

    /// Record a payload the delivery channel refused.
    pub fn record_dropped_payload(&self) {
        self.payloads_dropped_total.inc();
    }

    // ========================================================================
    // Encoding
    // ========================================================================

    /// Encode all metrics in Prometheus text exposition format.
    pub fn encode(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
