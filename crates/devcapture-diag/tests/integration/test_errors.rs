//! Non-success responses and transport failures

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use devcapture_diag::{DiagError, DiagRequest, DiagnosticsClient};
use reqwest::StatusCode;

use crate::common;

#[tokio::test]
async fn test_api_error_carries_server_detail() {
    let (server, client) = common::setup_diag_mock().await;

    Mock::given(method("POST"))
        .and(path("/diag/run"))
        .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
            "detail": "Rate limit exceeded"
        })))
        .mount(&server)
        .await;

    let err = client
        .run(&DiagRequest::new("https://app.example.com"))
        .await
        .unwrap_err();

    match err {
        DiagError::Api { status, detail } => {
            assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
            assert_eq!(detail, "Rate limit exceeded");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_api_error_falls_back_to_status_text() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/healthz"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>upstream down</html>"))
        .mount(&server)
        .await;
    let client = DiagnosticsClient::new(server.uri(), None);

    let err = client.health().await.unwrap_err();

    assert_eq!(err.status(), Some(StatusCode::BAD_GATEWAY));
    assert!(matches!(err, DiagError::Api { ref detail, .. } if detail == "Bad Gateway"));
}

#[tokio::test]
async fn test_unauthorized_detail() {
    let (server, client) = common::setup_diag_mock().await;

    Mock::given(method("POST"))
        .and(path("/diag/run"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "detail": "Missing bearer token"
        })))
        .mount(&server)
        .await;

    let err = client
        .run(&DiagRequest::new("https://app.example.com"))
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "DevDiag API error (401 Unauthorized): Missing bearer token"
    );
}

#[tokio::test]
async fn test_malformed_success_body_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/probes"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;
    let client = DiagnosticsClient::new(server.uri(), None);

    let err = client.presets().await.unwrap_err();
    assert!(matches!(err, DiagError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_unreachable_service_is_network_error() {
    let base = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        format!("http://{}", listener.local_addr().unwrap())
    };
    let client = DiagnosticsClient::new(base, None);

    let err = client.health().await.unwrap_err();
    assert!(matches!(err, DiagError::Network(_)));
}
