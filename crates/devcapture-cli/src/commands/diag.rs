//! Diag command - Query the DevDiag diagnostics service
//!
//! Provides the `devcapture diag` CLI command which:
//! 1. Checks service liveness (`health`)
//! 2. Lists the probe presets the service accepts (`presets`)
//! 3. Runs diagnostics against a URL and reports problems and fixes (`run`)

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use devcapture_diag::{DiagRequest, DiagResponse, DiagnosticsClient, Preset};
use tracing::info;

use crate::output::Output;

/// Arguments shared by every `devcapture diag` subcommand
#[derive(Debug, Args)]
pub struct DiagArgs {
    /// DevDiag service root
    #[arg(long, env = "DEVDIAG_URL", default_value = "http://localhost:8080")]
    pub base_url: String,

    /// Bearer token for services that verify JWTs
    #[arg(long, env = "DEVDIAG_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: DiagCommand,
}

/// Diag subcommands
#[derive(Debug, Subcommand)]
pub enum DiagCommand {
    /// Check that the service is up
    Health,
    /// List available probe presets
    Presets,
    /// Run diagnostics against a URL
    Run {
        /// Page to diagnose
        url: String,
        /// Probe preset (chat, embed, app, full)
        #[arg(long)]
        preset: Option<Preset>,
        /// Problem code to mute (repeatable)
        #[arg(long, value_name = "CODE")]
        suppress: Vec<String>,
        /// Extra flag passed to the probe runner (repeatable)
        #[arg(long = "extra-arg", value_name = "ARG", allow_hyphen_values = true)]
        extra_args: Vec<String>,
    },
}

impl DiagArgs {
    pub async fn execute(&self, out: &Output) -> Result<()> {
        let client = DiagnosticsClient::new(&self.base_url, self.token.clone());

        match &self.command {
            DiagCommand::Health => {
                let health = client
                    .health()
                    .await
                    .with_context(|| format!("Health check against {} failed", client.base_url()))?;

                out.report(&health, |out| {
                    if health.ok {
                        out.success(&format!("{} {} is up", health.service, health.version));
                    } else {
                        out.warn(&format!("{} reports it is not ok", health.service));
                    }
                    out.field("Service", client.base_url());
                })?;
            }
            DiagCommand::Presets => {
                let list = client
                    .presets()
                    .await
                    .context("Failed to fetch presets")?;

                out.report(&list, |out| {
                    out.success(&format!("{} presets", list.presets.len()));
                    for preset in &list.presets {
                        out.bullet(preset);
                    }
                    if !list.notes.is_empty() {
                        out.line("");
                        out.line(&list.notes);
                    }
                })?;
            }
            DiagCommand::Run {
                url,
                preset,
                suppress,
                extra_args,
            } => {
                let request = build_request(url, *preset, suppress, extra_args);
                info!(url = %url, "Running diagnostics");

                let response = client
                    .run(&request)
                    .await
                    .with_context(|| format!("Diagnostics run for {} failed", url))?;

                out.report(&response, |out| print_report(out, &response))?;
            }
        }

        Ok(())
    }
}

fn build_request(
    url: &str,
    preset: Option<Preset>,
    suppress: &[String],
    extra_args: &[String],
) -> DiagRequest {
    let mut request = DiagRequest::new(url);
    if let Some(preset) = preset {
        request = request.preset(preset);
    }
    if !suppress.is_empty() {
        request = request.suppress(suppress.iter().cloned());
    }
    if !extra_args.is_empty() {
        request = request.extra_args(extra_args.iter().cloned());
    }
    request
}

fn print_report(out: &Output, response: &DiagResponse) {
    let result = &response.result;

    if result.is_clean() {
        out.success(&format!("No problems found ({} preset)", response.preset));
    } else {
        out.warn(&format!(
            "{} problem{} found ({} preset)",
            result.problems.len(),
            if result.problems.len() == 1 { "" } else { "s" },
            response.preset
        ));
    }
    out.field("URL", &response.url);
    if let Some(severity) = result.severity {
        out.field("Severity", severity);
    }
    if let Some(score) = result.score {
        out.field("Score", format!("{:.1}", score));
    }

    for problem in &result.problems {
        out.line("");
        out.line(problem);
        for fix in result.fixes.get(problem).into_iter().flatten() {
            out.bullet(fix);
        }
    }
}
