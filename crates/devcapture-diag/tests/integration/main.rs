//! Integration tests for devcapture-diag
//!
//! Uses wiremock to simulate the DevDiag HTTP service and verifies the
//! client's request shapes, response parsing and error mapping.

mod common;

mod test_capture;
mod test_endpoints;
mod test_errors;
