//! Terminal output for the `devcapture` commands
//!
//! Every command produces one result. In JSON mode that result is printed as
//! a single pretty JSON document on stdout and human chatter is suppressed;
//! status lines still reach stderr as one-line JSON objects.

use anyhow::{Context, Result};
use serde::Serialize;

/// Output format selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
}

/// Printer bound to the format chosen on the command line.
#[derive(Debug, Clone, Copy)]
pub struct Output {
    format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    /// Prints `value` as the command's JSON result, or runs `human` to
    /// render it for a terminal.
    pub fn report<T, F>(&self, value: &T, human: F) -> Result<()>
    where
        T: Serialize + ?Sized,
        F: FnOnce(&Self),
    {
        if self.is_json() {
            let text =
                serde_json::to_string_pretty(value).context("Failed to serialize command output")?;
            println!("{}", text);
        } else {
            human(self);
        }
        Ok(())
    }

    /// Headline for a successful result.
    pub fn success(&self, message: &str) {
        if !self.is_json() {
            println!("\u{2713} {}", message);
        }
    }

    pub fn warn(&self, message: &str) {
        if self.is_json() {
            eprintln!("{}", serde_json::json!({ "level": "warning", "message": message }));
        } else {
            eprintln!("\u{26a0} Warning: {}", message);
        }
    }

    pub fn error(&self, message: &str) {
        if self.is_json() {
            eprintln!("{}", serde_json::json!({ "success": false, "error": message }));
        } else {
            eprintln!("\u{2717} Error: {}", message);
        }
    }

    /// Indented free-form line.
    pub fn line(&self, text: &str) {
        if !self.is_json() {
            println!("  {}", text);
        }
    }

    /// Aligned `label: value` row.
    pub fn field(&self, label: &str, value: impl std::fmt::Display) {
        if !self.is_json() {
            println!("  {:<10} {}", format!("{}:", label), value);
        }
    }

    /// Nested list item under the previous line.
    pub fn bullet(&self, text: &str) {
        if !self.is_json() {
            println!("    - {}", text);
        }
    }
}
