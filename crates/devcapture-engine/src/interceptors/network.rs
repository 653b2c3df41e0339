//! HTTP call observation
//!
//! [`observe_call`] wraps any future that yields a response-like value and
//! records one [`NetworkSpan`] per call. [`TracedClient`] applies it to every
//! request sent through a `reqwest::Client`.
//!
//! The observed future's output is returned untouched: the same response on
//! success, the identical error on failure. A future dropped before it
//! completes is recorded as failed with [`ABORTED_MESSAGE`].

use std::fmt::Display;
use std::future::Future;
use std::time::{Duration, Instant};

use devcapture_core::NetworkSpan;
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::{IntoUrl, Method, Request, RequestBuilder, Response};

use super::Slot;
use crate::engine::DevCapture;

pub(crate) static NETWORK_SLOT: Slot = Slot::new();

/// Error recorded for calls whose future was dropped before completion.
pub const ABORTED_MESSAGE: &str = "request aborted";

/// Response types that carry an HTTP status code.
pub trait ResponseStatus {
    fn status_code(&self) -> u16;
}

impl ResponseStatus for Response {
    fn status_code(&self) -> u16 {
        self.status().as_u16()
    }
}

impl ResponseStatus for reqwest::StatusCode {
    fn status_code(&self) -> u16 {
        self.as_u16()
    }
}

/// Awaits `call` and records its outcome with the engine owning the
/// network interceptor. Without an owner this is a plain `.await`.
///
/// # Arguments
/// * `method` - HTTP method of the observed call
/// * `url` - Request URL as sent (scrubbed before it is buffered)
/// * `call` - The real operation
pub async fn observe_call<F, T, E>(method: &str, url: &str, call: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    T: ResponseStatus,
    E: Display,
{
    let Some(engine) = NETWORK_SLOT.current() else {
        return call.await;
    };

    let mut pending = PendingCall {
        engine,
        method: method.to_string(),
        url: url.to_string(),
        started: Instant::now(),
        finished: false,
    };

    let result = call.await;
    pending.finish(&result);
    result
}

/// A call in flight. Records an aborted span if dropped unfinished.
struct PendingCall {
    engine: DevCapture,
    method: String,
    url: String,
    started: Instant,
    finished: bool,
}

impl PendingCall {
    fn finish<T: ResponseStatus, E: Display>(&mut self, result: &Result<T, E>) {
        self.finished = true;
        let latency_ms = round_millis(self.started.elapsed());
        let span = match result {
            Ok(response) => NetworkSpan::completed(
                self.method.as_str(),
                self.url.as_str(),
                response.status_code(),
                latency_ms,
            ),
            Err(e) => {
                let message = self
                    .engine
                    .redactor()
                    .scrub_message(&e.to_string(), &self.url);
                NetworkSpan::failed(self.method.as_str(), self.url.as_str(), latency_ms, message)
            }
        };
        self.engine.capture_network(span);
    }
}

impl Drop for PendingCall {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let latency_ms = round_millis(self.started.elapsed());
        self.engine.capture_network(NetworkSpan::failed(
            self.method.as_str(),
            self.url.as_str(),
            latency_ms,
            ABORTED_MESSAGE,
        ));
    }
}

/// Elapsed time rounded to the nearest whole millisecond.
fn round_millis(elapsed: Duration) -> u64 {
    ((elapsed.as_micros() + 500) / 1000) as u64
}

// ============================================================================
// TracedClient
// ============================================================================

/// `reqwest::Client` wrapper whose requests are observed.
///
/// Behaves exactly like the wrapped client; requests built here are sent
/// through [`observe_call`].
#[derive(Debug, Clone, Default)]
pub struct TracedClient {
    inner: reqwest::Client,
}

impl TracedClient {
    pub fn new(client: reqwest::Client) -> Self {
        Self { inner: client }
    }

    /// The wrapped client. Requests sent on it directly are not observed.
    pub fn inner(&self) -> &reqwest::Client {
        &self.inner
    }

    pub fn request<U: IntoUrl>(&self, method: Method, url: U) -> TracedRequestBuilder {
        TracedRequestBuilder {
            client: self.clone(),
            builder: self.inner.request(method, url),
        }
    }

    pub fn get<U: IntoUrl>(&self, url: U) -> TracedRequestBuilder {
        self.request(Method::GET, url)
    }

    pub fn post<U: IntoUrl>(&self, url: U) -> TracedRequestBuilder {
        self.request(Method::POST, url)
    }

    /// Executes a prepared request and records the call.
    pub async fn execute(&self, request: Request) -> reqwest::Result<Response> {
        let method = request.method().to_string();
        let url = request.url().to_string();
        observe_call(&method, &url, self.inner.execute(request)).await
    }
}

/// Request builder returned by [`TracedClient`].
#[derive(Debug)]
pub struct TracedRequestBuilder {
    client: TracedClient,
    builder: RequestBuilder,
}

impl TracedRequestBuilder {
    pub fn header(self, key: HeaderName, value: HeaderValue) -> Self {
        self.map(|b| b.header(key, value))
    }

    pub fn bearer_auth<T: Display>(self, token: T) -> Self {
        self.map(|b| b.bearer_auth(token))
    }

    pub fn json<T: serde::Serialize + ?Sized>(self, json: &T) -> Self {
        self.map(|b| b.json(json))
    }

    pub fn body<T: Into<reqwest::Body>>(self, body: T) -> Self {
        self.map(|b| b.body(body))
    }

    pub fn timeout(self, timeout: Duration) -> Self {
        self.map(|b| b.timeout(timeout))
    }

    /// Sends the request. A request that cannot be built fails without
    /// being recorded, since it never reached the network.
    pub async fn send(self) -> reqwest::Result<Response> {
        let request = self.builder.build()?;
        self.client.execute(request).await
    }

    fn map(self, f: impl FnOnce(RequestBuilder) -> RequestBuilder) -> Self {
        Self {
            client: self.client,
            builder: f(self.builder),
        }
    }
}
