//! DevCapture CLI - Command-line interface for DevCapture
//!
//! Provides commands for:
//! - Viewing, editing and validating the telemetry configuration
//! - Previewing how URLs are redacted before capture
//! - Querying the DevDiag diagnostics service
//!
//! The CLI runs its own capture engine from the configuration file, so its
//! diagnostics calls and error logs are reported like any other client's.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use devcapture_core::TelemetryConfig;
use devcapture_engine::{global, CaptureMetrics, DevCapture, ErrorLogLayer};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{
    completions::CompletionsCommand, config::ConfigCommand, diag::DiagArgs,
    redact::RedactCommand,
};
use output::{Output, OutputFormat};

/// Time the delivery worker gets to send the final payload on exit
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

#[derive(Debug, Parser)]
#[command(name = "devcapture", version, about = "Client-side telemetry capture toolkit")]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<String>,

    /// Override the configured session sampling rate (0.0 - 1.0)
    #[arg(long, global = true)]
    sample_rate: Option<f64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// View and manage configuration
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Show how a URL is recorded after redaction
    Redact(RedactCommand),
    /// Query the DevDiag diagnostics service
    Diag(DiagArgs),
    /// Generate shell completions
    Completions(CompletionsCommand),
}

impl Cli {
    fn config_path(&self) -> PathBuf {
        self.config
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(TelemetryConfig::default_path)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup tracing
    let filter = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(ErrorLogLayer::new())
        .init();

    let out = Output::new(if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    });

    let config_path = cli.config_path();

    // Cancelled on SIGINT/SIGTERM: flushes the engine and ends the command.
    let unload = CancellationToken::new();
    tokio::spawn(devcapture_engine::shutdown_signal(unload.clone()));
    let capture_metrics = start_capture(&cli, &config_path, &unload);

    let run = async {
        match &cli.command {
            Commands::Config(cmd) => cmd.execute(&out, &config_path).await,
            Commands::Redact(cmd) => cmd.execute(&out, &config_path).await,
            Commands::Diag(cmd) => cmd.execute(&out).await,
            Commands::Completions(cmd) => cmd.execute(&out).await,
        }
    };

    let result = tokio::select! {
        result = run => result,
        _ = unload.cancelled() => Err(anyhow::anyhow!("Interrupted")),
    };

    if let Some(metrics) = capture_metrics {
        global::shutdown(SHUTDOWN_GRACE).await;
        if cli.verbose >= 2 {
            match metrics.encode() {
                Ok(text) => eprint!("{}", text),
                Err(e) => warn!(error = %e, "Failed to encode capture metrics"),
            }
        }
    }

    result
}

/// Initializes the process-wide capture engine and registers its unload
/// flush on `unload`.
///
/// Returns the engine's self-metrics, or `None` when capture is off: no
/// configuration file, or one that fails to load or validate.
fn start_capture(
    cli: &Cli,
    config_path: &Path,
    unload: &CancellationToken,
) -> Option<Arc<CaptureMetrics>> {
    if !config_path.exists() {
        debug!(config_path = %config_path.display(), "No configuration file, telemetry capture off");
        return None;
    }

    let mut config = match TelemetryConfig::load(config_path) {
        Ok(config) => config,
        Err(e) => {
            warn!(error = %e, "Telemetry capture disabled");
            return None;
        }
    };
    if let Some(rate) = cli.sample_rate {
        config.sampling_rate = rate;
    }

    let metrics = match CaptureMetrics::new() {
        Ok(metrics) => Arc::new(metrics),
        Err(e) => {
            warn!(error = %e, "Telemetry capture disabled");
            return None;
        }
    };

    match global::init_with(DevCapture::builder(config).metrics(metrics.clone())) {
        Ok(engine) => {
            debug!(sampled = engine.is_sampled(), "Telemetry capture started");
            global::flush_current_on(unload.clone());
            Some(metrics)
        }
        Err(e) => {
            warn!(error = %e, "Telemetry capture disabled");
            None
        }
    }
}
