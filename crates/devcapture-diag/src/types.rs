//! Request and response bodies of the DevDiag HTTP API

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ============================================================================
// Preset / Severity
// ============================================================================

/// Probe selection run by the service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    Chat,
    Embed,
    #[default]
    App,
    Full,
}

impl Preset {
    pub const ALL: [Preset; 4] = [Preset::Chat, Preset::Embed, Preset::App, Preset::Full];

    pub fn as_str(&self) -> &'static str {
        match self {
            Preset::Chat => "chat",
            Preset::Embed => "embed",
            Preset::App => "app",
            Preset::Full => "full",
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Preset::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown preset '{s}' (expected chat, embed, app or full)"))
    }
}

/// Overall severity reported for a diagnostics run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warn,
    Error,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Info => "info",
            Severity::Warn => "warn",
            Severity::Error => "error",
            Severity::Critical => "critical",
        };
        f.write_str(s)
    }
}

// ============================================================================
// Bodies
// ============================================================================

/// `GET /healthz` response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Health {
    pub ok: bool,
    pub service: String,
    pub version: String,
}

/// `GET /probes` response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresetList {
    pub presets: Vec<String>,
    #[serde(default)]
    pub notes: String,
}

/// `POST /diag/run` request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagRequest {
    /// Page to diagnose
    pub url: String,
    /// Probe preset; the client sends `app` when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<Preset>,
    /// Problem codes to mute
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suppress: Option<Vec<String>>,
    /// Extra flags passed through to the probe runner
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_args: Option<Vec<String>>,
}

impl DiagRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            preset: None,
            suppress: None,
            extra_args: None,
        }
    }

    pub fn preset(mut self, preset: Preset) -> Self {
        self.preset = Some(preset);
        self
    }

    pub fn suppress<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.suppress = Some(codes.into_iter().map(Into::into).collect());
        self
    }

    pub fn extra_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_args = Some(args.into_iter().map(Into::into).collect());
        self
    }
}

/// `POST /diag/run` response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagResponse {
    pub ok: bool,
    pub url: String,
    pub preset: String,
    pub result: DiagResult,
}

/// Findings of one diagnostics run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiagResult {
    /// Problem codes found
    #[serde(default)]
    pub problems: Vec<String>,
    /// Suggested fixes keyed by problem code
    #[serde(default)]
    pub fixes: BTreeMap<String, Vec<String>>,
    /// Raw probe evidence
    #[serde(default)]
    pub evidence: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
}

impl DiagResult {
    /// True when no problem was reported.
    pub fn is_clean(&self) -> bool {
        self.problems.is_empty()
    }
}
