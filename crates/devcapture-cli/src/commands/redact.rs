//! Redact command - Preview how a URL is recorded
//!
//! Applies the configured query-parameter redaction (plus any `--param`
//! given on the command line) to a URL and prints the result.

use std::path::Path;

use anyhow::Result;
use clap::Args;
use devcapture_core::{Redactor, TelemetryConfig};

use crate::output::Output;

/// Arguments for `devcapture redact`
#[derive(Debug, Args)]
pub struct RedactCommand {
    /// URL to scrub (relative URLs are resolved against the configured origin)
    pub url: String,

    /// Additional query parameter to mask (repeatable)
    #[arg(long = "param", value_name = "NAME")]
    pub params: Vec<String>,
}

impl RedactCommand {
    pub async fn execute(&self, out: &Output, config_path: &Path) -> Result<()> {
        let config = TelemetryConfig::load_or_default(config_path);
        let redacted = self.scrub(config);

        out.report(
            &serde_json::json!({ "input": self.url, "redacted": redacted }),
            |out| {
                if redacted == self.url {
                    out.success("Nothing to redact");
                } else {
                    out.success("Redacted URL");
                }
                out.line(&redacted);
            },
        )
    }

    fn scrub(&self, mut config: TelemetryConfig) -> String {
        config.redact_params.extend(self.params.iter().cloned());
        Redactor::new(&config).scrub_url(&self.url)
    }
}
