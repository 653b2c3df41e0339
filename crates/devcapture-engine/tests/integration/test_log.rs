//! Log interceptor: ERROR events become diagnostic events

use devcapture_engine::{ErrorLogLayer, Level};
use tracing_subscriber::layer::SubscriberExt;

use crate::common;

fn with_layer(emit: impl FnOnce()) {
    let subscriber = tracing_subscriber::registry().with(ErrorLogLayer::new());
    tracing::subscriber::with_default(subscriber, emit);
}

#[test]
fn test_error_events_are_captured() {
    let _serial = common::serial();
    let (engine, beacon) = common::capturing_engine(common::sampled_config());

    with_layer(|| {
        tracing::error!(table = "users", attempt = 2, "query failed");
        tracing::warn!("slow query");
        tracing::info!("connected");
    });

    let payload = common::flushed(&engine, &beacon);
    assert_eq!(payload.events.len(), 1);
    assert_eq!(payload.events[0].level, Level::Error);
    assert_eq!(payload.events[0].message, "query failed table=users attempt=2");

    engine.destroy();
}

#[test]
fn test_engine_own_events_are_ignored() {
    let _serial = common::serial();
    let (engine, beacon) = common::capturing_engine(common::sampled_config());

    with_layer(|| {
        tracing::error!(target: "devcapture_engine::delivery", "internal");
        tracing::error!(target: "billing", "charge declined");
    });

    let payload = common::flushed(&engine, &beacon);
    let messages: Vec<_> = payload.events.iter().map(|e| e.message.as_str()).collect();
    assert_eq!(messages, ["charge declined"]);

    engine.destroy();
}

#[test]
fn test_layer_is_inert_when_logs_are_disabled() {
    let _serial = common::serial();
    let toggles = devcapture_engine::CaptureToggles {
        logs: false,
        ..Default::default()
    };
    let (engine, beacon) = common::capturing_engine(common::sampled_config().capture(toggles));

    with_layer(|| tracing::error!("not observed"));

    assert!(common::flushed(&engine, &beacon).events.is_empty());
    engine.destroy();
}
