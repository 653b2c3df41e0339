//! Shared helpers for the engine integration tests

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use devcapture_engine::{ConfigBuilder, DevCapture, MemoryBeacon, Sampler};

static SERIAL: Mutex<()> = Mutex::new(());

/// Serializes tests that touch process-wide interceptor state.
pub fn serial() -> MutexGuard<'static, ()> {
    SERIAL.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Always-sampled config with a batch size large enough that nothing
/// flushes on its own during a test.
pub fn sampled_config() -> ConfigBuilder {
    ConfigBuilder::new()
        .sampling_rate(1.0)
        .origin("https://app.example.com")
        .max_batch_size(100)
        .flush_interval_ms(60_000)
}

/// Builds a sampled engine that owns every interceptor and records its
/// payloads in memory.
pub fn capturing_engine(config: ConfigBuilder) -> (DevCapture, Arc<MemoryBeacon>) {
    let beacon = Arc::new(MemoryBeacon::new());
    let engine = DevCapture::builder(config.build())
        .sampler(Sampler::seeded(11))
        .beacon(beacon.clone())
        .build()
        .expect("engine should build");
    (engine, beacon)
}

/// Flushes `engine` and returns everything its beacon received.
pub fn flushed(engine: &DevCapture, beacon: &MemoryBeacon) -> devcapture_engine::Payload {
    engine.flush();
    let mut all = devcapture_engine::Payload::default();
    for payload in beacon.payloads() {
        all.network.extend(payload.network);
        all.events.extend(payload.events);
    }
    all
}
