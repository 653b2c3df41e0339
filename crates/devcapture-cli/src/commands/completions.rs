//! Completions command - Shell completion scripts for `devcapture`
//!
//! `devcapture completions zsh` prints the script; `--output` writes it to a
//! file instead, creating parent directories as needed.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, CommandFactory};
use clap_complete::Shell;

use crate::output::Output;

/// Arguments for `devcapture completions`
#[derive(Debug, Args)]
pub struct CompletionsCommand {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,

    /// Write the script to this file instead of stdout
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

impl CompletionsCommand {
    pub async fn execute(&self, out: &Output) -> Result<()> {
        let script = self.script();

        let Some(path) = &self.output else {
            std::io::stdout()
                .write_all(&script)
                .context("Failed to write completions to stdout")?;
            return Ok(());
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        std::fs::write(path, &script)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        out.report(
            &serde_json::json!({
                "shell": self.shell.to_string(),
                "path": path.display().to_string(),
            }),
            |out| {
                out.success(&format!("Wrote {} completions", self.shell));
                out.field("File", path.display());
            },
        )
    }

    fn script(&self) -> Vec<u8> {
        let mut cmd = crate::Cli::command();
        let mut script = Vec::new();
        clap_complete::generate(self.shell, &mut cmd, "devcapture", &mut script);
        script
    }
}
