//! Process-wide engine accessor: replace tears down the previous engine

use std::sync::Arc;
use std::time::Duration;

use devcapture_engine::global;
use devcapture_engine::{
    ConfigBuilder, DevCapture, DiagnosticEvent, InterceptorKind, MemoryBeacon, Sampler,
    TelemetryError,
};
use tokio_util::sync::CancellationToken;

use crate::common;

fn builder(beacon: &Arc<MemoryBeacon>) -> devcapture_engine::DevCaptureBuilder {
    DevCapture::builder(common::sampled_config().build())
        .sampler(Sampler::seeded(5))
        .beacon(beacon.clone())
}

#[tokio::test]
async fn test_init_replaces_and_tears_down_previous() {
    let _serial = common::serial();
    let first_beacon = Arc::new(MemoryBeacon::new());
    let second_beacon = Arc::new(MemoryBeacon::new());

    let first = global::init_with(builder(&first_beacon)).unwrap();
    assert!(global::get().unwrap().same_engine(&first));
    first.capture_event(DiagnosticEvent::error("from first"));

    let second = global::init_with(builder(&second_beacon)).unwrap();

    assert!(first.is_destroyed());
    assert_eq!(first_beacon.count(), 1);
    assert_eq!(first_beacon.payloads()[0].events[0].message, "from first");
    assert!(global::get().unwrap().same_engine(&second));
    assert!(InterceptorKind::Network.owner().unwrap().same_engine(&second));

    global::shutdown(Duration::from_millis(50)).await;
    assert!(global::get().is_none());
    assert!(second.is_destroyed());
    assert!(!InterceptorKind::Network.is_installed());
}

#[tokio::test]
async fn test_failed_init_leaves_no_current_engine() {
    let _serial = common::serial();
    let beacon = Arc::new(MemoryBeacon::new());
    let previous = global::init_with(builder(&beacon)).unwrap();

    let invalid = ConfigBuilder::new().max_batch_size(0).build();
    let result = global::init(invalid);

    assert!(matches!(result, Err(TelemetryError::InvalidConfig(_))));
    assert!(previous.is_destroyed());
    assert!(global::get().is_none());
}

#[tokio::test]
async fn test_cancelled_token_flushes_current_engine() {
    let _serial = common::serial();
    let beacon = Arc::new(MemoryBeacon::new());
    let engine = global::init_with(builder(&beacon)).unwrap();

    let token = CancellationToken::new();
    let watcher = global::flush_current_on(token.clone());

    engine.capture_event(DiagnosticEvent::error("page hidden"));
    token.cancel();
    watcher.await.unwrap();

    assert_eq!(beacon.count(), 1);
    assert!(!engine.is_destroyed());

    global::shutdown(Duration::from_millis(50)).await;
}
