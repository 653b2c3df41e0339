//! The client's own calls are observed by an installed capture engine

use std::sync::Arc;

use devcapture_core::{ConfigBuilder, Sampler};
use devcapture_engine::{DevCapture, MemoryBeacon};

use crate::common;

#[tokio::test]
async fn test_client_calls_are_captured_and_token_free() {
    let (server, _) = common::setup_diag_mock().await;
    let client = devcapture_diag::DiagnosticsClient::new(
        format!("{}/", server.uri()),
        Some(common::TEST_TOKEN.to_string()),
    );

    let beacon = Arc::new(MemoryBeacon::new());
    let config = ConfigBuilder::new()
        .sampling_rate(1.0)
        .origin("https://app.example.com")
        .build();
    let engine = DevCapture::builder(config)
        .sampler(Sampler::seeded(9))
        .beacon(beacon.clone())
        .build()
        .unwrap();

    client.health().await.unwrap();
    client.presets().await.unwrap();
    engine.destroy();

    // Other tests in this binary may run concurrently; keep only the calls
    // that went to this test's server.
    let spans: Vec<_> = beacon
        .payloads()
        .into_iter()
        .flat_map(|p| p.network)
        .filter(|s| s.url.starts_with(&server.uri()))
        .collect();

    assert_eq!(spans.len(), 2);
    assert!(spans[0].url.ends_with("/healthz"));
    assert!(spans[1].url.ends_with("/probes"));
    assert!(spans.iter().all(|s| s.status == Some(200)));
    assert!(spans.iter().all(|s| !s.url.contains(common::TEST_TOKEN)));
}
