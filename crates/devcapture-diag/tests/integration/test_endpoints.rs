//! Request shapes and response parsing for each DevDiag endpoint

use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, ResponseTemplate};

use devcapture_diag::{DiagRequest, Preset, Severity};

use crate::common;

#[tokio::test]
async fn test_health() {
    let (_server, client) = common::setup_diag_mock().await;

    let health = client.health().await.expect("health failed");

    assert!(health.ok);
    assert_eq!(health.service, "devdiag-http");
    assert_eq!(health.version, "0.1.0");
}

#[tokio::test]
async fn test_presets() {
    let (_server, client) = common::setup_diag_mock().await;

    let list = client.presets().await.expect("presets failed");

    assert_eq!(list.presets, ["chat", "embed", "app", "full"]);
    assert!(list.notes.contains("suppress"));
}

#[tokio::test]
async fn test_run_sends_request_and_parses_result() {
    let (server, client) = common::setup_diag_mock().await;
    let target = "https://app.example.com/chat";

    Mock::given(method("POST"))
        .and(path("/diag/run"))
        .and(header("authorization", format!("Bearer {}", common::TEST_TOKEN).as_str()))
        .and(body_json(serde_json::json!({
            "url": target,
            "preset": "chat",
            "suppress": ["CSP_INLINE"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::run_response(target, "chat")))
        .expect(1)
        .mount(&server)
        .await;

    let response = client
        .run(&DiagRequest::new(target).preset(Preset::Chat).suppress(["CSP_INLINE"]))
        .await
        .expect("run failed");

    assert!(response.ok);
    assert_eq!(response.url, target);
    assert_eq!(response.preset, "chat");
    assert_eq!(response.result.problems, ["IFRAME_FRAME_ANCESTORS_BLOCKED"]);
    assert_eq!(
        response.result.fixes["IFRAME_FRAME_ANCESTORS_BLOCKED"],
        ["Add the embedding origin to frame-ancestors"]
    );
    assert_eq!(response.result.evidence["csp"], "frame-ancestors 'none'");
    assert_eq!(response.result.score, Some(62.5));
    assert_eq!(response.result.severity, Some(Severity::Error));
}

#[tokio::test]
async fn test_run_defaults_to_app_preset() {
    let (server, client) = common::setup_diag_mock().await;
    let target = "https://app.example.com/";

    Mock::given(method("POST"))
        .and(path("/diag/run"))
        .and(body_json(serde_json::json!({ "url": target, "preset": "app" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::run_response(target, "app")))
        .expect(1)
        .mount(&server)
        .await;

    let response = client.run(&DiagRequest::new(target)).await.expect("run failed");
    assert_eq!(response.preset, "app");
}

#[tokio::test]
async fn test_requests_without_token_are_unauthenticated() {
    let (server, _) = common::setup_diag_mock().await;
    let client = devcapture_diag::DiagnosticsClient::new(format!("{}/", server.uri()), None);

    client.health().await.expect("health failed");

    let requests = server.received_requests().await.unwrap();
    assert!(requests
        .iter()
        .all(|r| !r.headers.contains_key("authorization")));
}
