//! Global failure interceptors: panics and unobserved task errors

use std::io;

use devcapture_engine::{report_rejection, spawn_observed, InterceptorKind, Level};

use crate::common;

#[test]
fn test_panic_is_captured_and_flushed() {
    let _serial = common::serial();
    let (engine, beacon) = common::capturing_engine(common::sampled_config());
    assert!(InterceptorKind::Panic.is_installed());

    engine.capture_network(devcapture_engine::NetworkSpan::completed(
        "GET",
        "https://api.example.com/before-crash",
        200,
        4,
    ));

    let outcome = std::thread::spawn(|| panic!("worker exploded")).join();
    assert!(outcome.is_err());

    // The hook flushed on its own; nothing is left in the buffers.
    assert_eq!(engine.buffered(), (0, 0));
    let payloads = beacon.payloads();
    assert_eq!(payloads.len(), 1);
    assert_eq!(payloads[0].network.len(), 1);

    let event = &payloads[0].events[0];
    assert_eq!(event.level, Level::Error);
    assert_eq!(event.message, "worker exploded");
    let context = event.context.as_ref().unwrap();
    assert!(context["filename"]
        .as_str()
        .unwrap()
        .ends_with("test_failures.rs"));
    assert!(context["lineno"].as_u64().unwrap() > 0);
    assert!(context["colno"].as_u64().unwrap() > 0);

    engine.destroy();
}

#[test]
fn test_panic_after_destroy_is_not_captured() {
    let _serial = common::serial();
    let (engine, beacon) = common::capturing_engine(common::sampled_config());
    engine.destroy();

    let outcome = std::thread::spawn(|| panic!("after teardown")).join();
    assert!(outcome.is_err());
    assert_eq!(beacon.count(), 0);
}

#[tokio::test]
async fn test_failed_detached_task_is_reported() {
    let _serial = common::serial();
    let (engine, beacon) = common::capturing_engine(common::sampled_config());

    spawn_observed(async { Err::<(), _>(io::Error::new(io::ErrorKind::Other, "upstream closed")) })
        .await
        .unwrap();
    spawn_observed(async { Ok::<_, io::Error>(42) }).await.unwrap();

    let payload = common::flushed(&engine, &beacon);
    assert_eq!(payload.events.len(), 1);
    assert_eq!(payload.events[0].message, "Unhandled rejection: upstream closed");

    engine.destroy();
}

#[test]
fn test_report_rejection_directly() {
    let _serial = common::serial();
    let (engine, beacon) = common::capturing_engine(common::sampled_config());

    report_rejection("timeout waiting for lock");

    let payload = common::flushed(&engine, &beacon);
    assert_eq!(
        payload.events[0].message,
        "Unhandled rejection: timeout waiting for lock"
    );
    engine.destroy();
}
