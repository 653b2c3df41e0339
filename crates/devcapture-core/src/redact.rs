//! Redaction of sensitive values before records are buffered
//!
//! Query-parameter values named in the configuration are replaced with a
//! fixed marker. Headers named in the configuration are dropped entirely.
//! Redaction is best-effort: input that cannot be parsed as a URL passes
//! through untouched rather than blocking capture.

use std::borrow::Cow;
use std::collections::HashSet;

use reqwest::header::HeaderMap;
use url::{form_urlencoded, ParseError, Url};

use crate::config::TelemetryConfig;

/// Replacement written in place of a sensitive query value.
pub const REDACTION_MARKER: &str = "[REDACTED]";

/// Scrubs URLs, headers and error messages according to configuration.
#[derive(Debug, Clone)]
pub struct Redactor {
    params: HashSet<String>,
    headers: HashSet<String>,
    base: Option<Url>,
}

impl Redactor {
    /// Creates a new `Redactor` from configuration.
    ///
    /// An unparseable `origin` is ignored; relative URLs then pass through
    /// unchanged.
    pub fn new(config: &TelemetryConfig) -> Self {
        Self {
            params: config.redact_params.iter().cloned().collect(),
            headers: config
                .redact_headers
                .iter()
                .map(|h| h.to_ascii_lowercase())
                .collect(),
            base: config.origin.as_deref().and_then(|o| Url::parse(o).ok()),
        }
    }

    /// Mask the value of every configured query parameter in `raw`.
    ///
    /// Parameter order, the encoding of untouched pairs, the path and the
    /// fragment are preserved. Relative input is resolved against the
    /// configured origin first. Returns `raw` unchanged when it cannot be
    /// parsed.
    pub fn scrub_url(&self, raw: &str) -> String {
        let Some(mut url) = self.parse(raw) else {
            return raw.to_string();
        };

        if let Some(scrubbed) = url.query().and_then(|q| self.scrub_query(q)) {
            url.set_query(Some(&scrubbed));
        }

        url.to_string()
    }

    /// Copy `headers`, dropping every header whose name is in the redact set.
    pub fn scrub_headers(&self, headers: &HeaderMap) -> HeaderMap {
        let mut kept = HeaderMap::with_capacity(headers.len());
        for (name, value) in headers {
            if !self.headers.contains(name.as_str()) {
                kept.append(name.clone(), value.clone());
            }
        }
        kept
    }

    /// Replace every occurrence of `raw_url` inside `message` with its
    /// scrubbed form. HTTP client errors embed the request URL verbatim.
    pub fn scrub_message(&self, message: &str, raw_url: &str) -> String {
        if raw_url.is_empty() {
            return message.to_string();
        }
        let scrubbed = self.scrub_url(raw_url);
        if scrubbed == raw_url {
            message.to_string()
        } else {
            message.replace(raw_url, &scrubbed)
        }
    }

    fn parse(&self, raw: &str) -> Option<Url> {
        match Url::parse(raw) {
            Ok(url) => Some(url),
            Err(ParseError::RelativeUrlWithoutBase) => self.base.as_ref()?.join(raw).ok(),
            Err(_) => None,
        }
    }

    /// Rewrite a raw query string, or `None` if no pair matched.
    fn scrub_query(&self, query: &str) -> Option<String> {
        let mut matched = false;
        let pairs: Vec<Cow<'_, str>> = query
            .split('&')
            .map(|pair| {
                let raw_name = pair.split('=').next().unwrap_or(pair);
                let sensitive = form_urlencoded::parse(raw_name.as_bytes())
                    .next()
                    .is_some_and(|(name, _)| self.params.contains(name.as_ref()));
                if sensitive {
                    matched = true;
                    Cow::Owned(format!("{raw_name}={REDACTION_MARKER}"))
                } else {
                    Cow::Borrowed(pair)
                }
            })
            .collect();

        matched.then(|| pairs.join("&"))
    }
}
