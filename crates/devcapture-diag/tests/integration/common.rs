//! Shared helpers for DevDiag client integration tests

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use devcapture_diag::DiagnosticsClient;

/// Bearer token the mock server expects
pub const TEST_TOKEN: &str = "test-reader-jwt";

/// Sets up a mock server with the read-only endpoints and returns a
/// (MockServer, DiagnosticsClient) tuple.
///
/// Pre-configured endpoints:
/// - GET /healthz → service identity
/// - GET /probes → preset list
pub async fn setup_diag_mock() -> (MockServer, DiagnosticsClient) {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/healthz"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "ok": true,
            "service": "devdiag-http",
            "version": "0.1.0"
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/probes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "presets": ["chat", "embed", "app", "full"],
            "notes": "Probes are selected by preset; pass suppress codes to mute known issues."
        })))
        .mount(&server)
        .await;

    let client = DiagnosticsClient::new(server.uri(), Some(TEST_TOKEN.to_string()));

    (server, client)
}

/// A typical `/diag/run` success body for `url`.
pub fn run_response(url: &str, preset: &str) -> serde_json::Value {
    serde_json::json!({
        "ok": true,
        "url": url,
        "preset": preset,
        "result": {
            "problems": ["IFRAME_FRAME_ANCESTORS_BLOCKED"],
            "fixes": {
                "IFRAME_FRAME_ANCESTORS_BLOCKED": [
                    "Add the embedding origin to frame-ancestors"
                ]
            },
            "evidence": { "csp": "frame-ancestors 'none'" },
            "score": 62.5,
            "severity": "error"
        }
    })
}
