//! Network interceptor: transparency, span shape, abort policy, ownership

use std::fmt;
use std::time::Duration;

use devcapture_engine::{observe_call, InterceptorKind, TracedClient, ABORTED_MESSAGE};
use reqwest::StatusCode;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common;

async fn mock_server() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/items"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string("two items"))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    server
}

#[tokio::test]
async fn test_successful_call_is_transparent_and_recorded() {
    let _serial = common::serial();
    let server = mock_server().await;
    let (engine, beacon) = common::capturing_engine(common::sampled_config());
    let client = TracedClient::default();

    let url = format!("{}/items?token=secret&page=2", server.uri());
    let traced = client.get(&url).send().await.unwrap();
    let traced_status = traced.status();
    let traced_body = traced.text().await.unwrap();

    let plain = reqwest::get(&url).await.unwrap();
    assert_eq!(traced_status, plain.status());
    assert_eq!(traced_body, plain.text().await.unwrap());

    let payload = common::flushed(&engine, &beacon);
    assert_eq!(payload.network.len(), 1);
    let span = &payload.network[0];
    assert_eq!(span.method, "GET");
    assert_eq!(
        span.url,
        format!("{}/items?token=[REDACTED]&page=2", server.uri())
    );
    assert_eq!(span.status, Some(200));
    assert!(span.latency_ms.is_some());
    assert!(span.error.is_none());

    engine.destroy();
}

#[tokio::test]
async fn test_error_status_is_a_completed_call() {
    let _serial = common::serial();
    let server = mock_server().await;
    let (engine, beacon) = common::capturing_engine(common::sampled_config());

    let response = TracedClient::default()
        .post(format!("{}/missing", server.uri()))
        .body("{}")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let payload = common::flushed(&engine, &beacon);
    assert_eq!(payload.network[0].method, "POST");
    assert_eq!(payload.network[0].status, Some(404));
    assert!(!payload.network[0].is_error());

    engine.destroy();
}

#[tokio::test]
async fn test_failed_call_returns_same_error_and_records_scrubbed_message() {
    let _serial = common::serial();
    let url = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        format!("http://{}/items?key=s3cret", listener.local_addr().unwrap())
    };
    // The listener is closed; connecting to that port is refused.
    let (engine, beacon) = common::capturing_engine(common::sampled_config());

    let traced = TracedClient::default().get(&url).send().await.unwrap_err();
    let plain = reqwest::get(&url).await.unwrap_err();
    assert_eq!(traced.is_connect(), plain.is_connect());
    assert_eq!(traced.url(), plain.url());

    let payload = common::flushed(&engine, &beacon);
    assert_eq!(payload.network.len(), 1);
    let span = &payload.network[0];
    assert!(span.status.is_none());
    let message = span.error.as_deref().unwrap();
    assert!(!message.is_empty());
    assert!(!message.contains("s3cret"), "leaked secret: {message}");
    assert!(span.url.ends_with("/items?key=[REDACTED]"));

    engine.destroy();
}

#[derive(Debug, PartialEq)]
struct Refused(u32);

impl fmt::Display for Refused {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "refused with code {}", self.0)
    }
}

#[tokio::test]
async fn test_observe_call_passes_error_through_unchanged() {
    let _serial = common::serial();
    let (engine, beacon) = common::capturing_engine(common::sampled_config());

    let result = observe_call("DELETE", "https://api.example.com/v1/jobs/9", async {
        Err::<StatusCode, _>(Refused(7))
    })
    .await;
    assert_eq!(result, Err(Refused(7)));

    let ok = observe_call("GET", "https://api.example.com/v1/jobs", async {
        Ok::<_, Refused>(StatusCode::ACCEPTED)
    })
    .await;
    assert_eq!(ok, Ok(StatusCode::ACCEPTED));

    let payload = common::flushed(&engine, &beacon);
    assert_eq!(payload.network.len(), 2);
    assert_eq!(payload.network[0].error.as_deref(), Some("refused with code 7"));
    assert_eq!(payload.network[1].status, Some(202));

    engine.destroy();
}

#[tokio::test]
async fn test_aborted_call_is_recorded_as_error() {
    let _serial = common::serial();
    let (engine, beacon) = common::capturing_engine(common::sampled_config());

    let never = observe_call("GET", "https://api.example.com/stream?session=abc", async {
        std::future::pending::<Result<StatusCode, Refused>>().await
    });
    let outcome = tokio::time::timeout(Duration::from_millis(20), never).await;
    assert!(outcome.is_err());

    let payload = common::flushed(&engine, &beacon);
    assert_eq!(payload.network.len(), 1);
    let span = &payload.network[0];
    assert_eq!(span.error.as_deref(), Some(ABORTED_MESSAGE));
    assert!(span.status.is_none());
    assert_eq!(span.url, "https://api.example.com/stream?session=[REDACTED]");

    engine.destroy();
}

#[tokio::test]
async fn test_calls_without_owner_are_not_recorded() {
    let _serial = common::serial();
    let server = mock_server().await;
    let (engine, beacon) = common::capturing_engine(common::sampled_config());
    engine.destroy();
    assert!(!InterceptorKind::Network.is_installed());

    let response = TracedClient::default()
        .get(format!("{}/items?page=2", server.uri()))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(engine.buffered(), (0, 0));
    assert!(beacon.payloads().iter().all(|p| p.network.is_empty()));
}

#[tokio::test]
async fn test_replacement_engine_keeps_interceptor_after_old_one_is_destroyed() {
    let _serial = common::serial();
    let (first, first_beacon) = common::capturing_engine(common::sampled_config());
    let (second, second_beacon) = common::capturing_engine(common::sampled_config());
    assert!(InterceptorKind::Network.owner().unwrap().same_engine(&second));

    first.destroy();
    assert!(InterceptorKind::Network.is_installed());

    observe_call("GET", "https://api.example.com/ping", async {
        Ok::<_, Refused>(StatusCode::OK)
    })
    .await
    .unwrap();

    assert_eq!(common::flushed(&second, &second_beacon).network.len(), 1);
    assert!(first_beacon.payloads().iter().all(|p| p.network.is_empty()));

    second.destroy();
    assert!(!InterceptorKind::Network.is_installed());
}
