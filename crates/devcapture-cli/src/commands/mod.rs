//! CLI command implementations

pub mod completions;
pub mod config;
pub mod diag;
pub mod redact;
