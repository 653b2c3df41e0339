//! Config command - View and manage DevCapture configuration
//!
//! Provides the `devcapture config` CLI command which:
//! 1. Shows the effective configuration (YAML or JSON)
//! 2. Sets individual configuration values via dot-notation keys
//! 3. Validates the configuration file and reports errors

use std::path::Path;

use anyhow::{Context, Result};
use clap::Subcommand;
use devcapture_core::TelemetryConfig;
use tracing::info;

use crate::output::Output;

/// Keys accepted by `config set`, with a short description each
const SUPPORTED_KEYS: &[(&str, &str)] = &[
    ("sampling_rate", "Fraction of sessions captured (0.0 - 1.0)"),
    ("endpoint", "Collection endpoint (absolute, or relative to origin)"),
    ("origin", "Base URL for relative URLs and the endpoint ('none' to unset)"),
    ("redact_params", "Comma-separated query parameters to mask"),
    ("redact_headers", "Comma-separated headers to drop"),
    ("max_batch_size", "Records per stream that force a flush"),
    ("flush_interval_ms", "Milliseconds between periodic flushes"),
    ("queue_capacity", "Payloads waiting for delivery before drops"),
    ("auth_token", "Bearer token for the endpoint ('none' to unset)"),
    ("capture.network", "Observe HTTP calls (true|false)"),
    ("capture.logs", "Observe ERROR log events (true|false)"),
    ("capture.panics", "Observe panics (true|false)"),
    ("capture.rejections", "Observe failed detached tasks (true|false)"),
];

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "capture.network")
        key: String,
        /// New value
        value: String,
    },
    /// Validate configuration file
    Validate,
}

impl ConfigCommand {
    /// Execute the config command against the file at `config_path`
    pub async fn execute(&self, out: &Output, config_path: &Path) -> Result<()> {
        match self {
            ConfigCommand::Show => show(out, config_path),
            ConfigCommand::Set { key, value } => set(out, config_path, key, value),
            ConfigCommand::Validate => validate(out, config_path),
        }
    }
}

/// Show the effective configuration
fn show(out: &Output, config_path: &Path) -> Result<()> {
    let config = redacted(&TelemetryConfig::load_or_default(config_path));
    info!(config_path = %config_path.display(), "Showing configuration");

    let yaml = serde_yaml::to_string(&config).context("Failed to serialize configuration to YAML")?;
    out.report(&config, |out| {
        out.success(&format!("Configuration ({})", config_path.display()));
        out.line("");
        for line in yaml.lines() {
            out.line(line);
        }
    })
}

/// Set a configuration value using dot-notation
fn set(out: &Output, config_path: &Path, key: &str, value: &str) -> Result<()> {
    let mut config = TelemetryConfig::load_or_default(config_path);
    info!(key = %key, "Setting configuration value");

    if let Err(e) = apply_config_value(&mut config, key, value) {
        return out.report(
            &serde_json::json!({ "success": false, "key": key, "error": e.to_string() }),
            |out| {
                out.error(&format!("Failed to set '{}': {}", key, e));
                out.line("");
                out.line("Supported keys:");
                for (name, description) in SUPPORTED_KEYS {
                    out.line(&format!("  {:<22} - {}", name, description));
                }
            },
        );
    }

    // Only the changed key blocks the save; `config validate` reports the rest
    let field = key.split('.').next().unwrap_or(key);
    let errors: Vec<String> = config
        .validate()
        .iter()
        .filter(|e| e.field == field)
        .map(|e| e.to_string())
        .collect();
    if !errors.is_empty() {
        return out.report(
            &serde_json::json!({ "success": false, "key": key, "errors": errors }),
            |out| out.error(&format!("Invalid value for '{}': {}", key, errors.join("; "))),
        );
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create configuration directory")?;
    }
    let yaml = serde_yaml::to_string(&config).context("Failed to serialize configuration")?;
    std::fs::write(config_path, yaml).context("Failed to write configuration file")?;

    out.report(
        &serde_json::json!({
            "success": true,
            "key": key,
            "config_path": config_path.display().to_string(),
        }),
        |out| {
            out.success(&format!("Set {}", key));
            out.field("Saved to", config_path.display());
        },
    )
}

/// Validate configuration file
fn validate(out: &Output, config_path: &Path) -> Result<()> {
    // Load the file explicitly (not load_or_default) so parse errors surface
    let errors: Vec<String> = match TelemetryConfig::load(config_path) {
        Ok(config) => {
            info!(config_path = %config_path.display(), "Validating configuration");
            config.validate().iter().map(|e| e.to_string()).collect()
        }
        Err(e) if config_path.exists() => vec![format!("Failed to parse configuration: {}", e)],
        Err(_) => {
            return out.report(
                &serde_json::json!({
                    "valid": false,
                    "config_path": config_path.display().to_string(),
                    "errors": ["Configuration file not found"],
                }),
                |out| {
                    out.warn(&format!(
                        "Configuration file not found at {}",
                        config_path.display()
                    ));
                    out.line("Telemetry capture stays off until one exists.");
                    out.line("Run 'devcapture config set origin <url>' to create one.");
                },
            );
        }
    };

    out.report(
        &serde_json::json!({
            "valid": errors.is_empty(),
            "config_path": config_path.display().to_string(),
            "errors": errors,
        }),
        |out| {
            if errors.is_empty() {
                out.success("Configuration is valid");
            } else {
                out.error(&format!(
                    "Configuration has {} error{}:",
                    errors.len(),
                    if errors.len() == 1 { "" } else { "s" }
                ));
            }
            out.field("File", config_path.display());
            for error in &errors {
                out.bullet(error);
            }
        },
    )
}

/// Copy of `config` safe to print: the auth token is masked.
fn redacted(config: &TelemetryConfig) -> TelemetryConfig {
    let mut shown = config.clone();
    if shown.auth_token.is_some() {
        shown.auth_token = Some(devcapture_core::redact::REDACTION_MARKER.to_string());
    }
    shown
}

/// Apply a dot-notation key/value pair to a TelemetryConfig
fn apply_config_value(config: &mut TelemetryConfig, key: &str, value: &str) -> Result<()> {
    match key {
        "sampling_rate" => {
            config.sampling_rate = value
                .parse::<f64>()
                .context("Expected a number between 0.0 and 1.0")?;
        }
        "endpoint" => {
            config.endpoint = value.to_string();
        }
        "origin" => {
            config.origin = optional(value);
        }
        "redact_params" => {
            config.redact_params = list(value);
        }
        "redact_headers" => {
            config.redact_headers = list(value);
        }
        "max_batch_size" => {
            config.max_batch_size = value
                .parse::<usize>()
                .context("Expected a positive integer")?;
        }
        "flush_interval_ms" => {
            config.flush_interval_ms = value
                .parse::<u64>()
                .context("Expected a positive integer")?;
        }
        "queue_capacity" => {
            config.queue_capacity = value
                .parse::<usize>()
                .context("Expected a positive integer")?;
        }
        "auth_token" => {
            config.auth_token = optional(value);
        }
        "capture.network" => config.capture.network = flag(value)?,
        "capture.logs" => config.capture.logs = flag(value)?,
        "capture.panics" => config.capture.panics = flag(value)?,
        "capture.rejections" => config.capture.rejections = flag(value)?,
        _ => {
            anyhow::bail!("Unknown configuration key: '{}'", key);
        }
    }

    Ok(())
}

fn optional(value: &str) -> Option<String> {
    if value.is_empty() || value == "none" {
        None
    } else {
        Some(value.to_string())
    }
}

fn list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn flag(value: &str) -> Result<bool> {
    value
        .parse::<bool>()
        .context("Expected 'true' or 'false'")
}
