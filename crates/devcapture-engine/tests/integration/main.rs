//! Integration tests for devcapture-engine
//!
//! These tests install the process-wide interceptors, so every test takes
//! the shared lock in `common` before building an engine. Uses wiremock to
//! stand in for the services the observed HTTP calls go to.

mod common;

mod test_failures;
mod test_global;
mod test_log;
mod test_network;
