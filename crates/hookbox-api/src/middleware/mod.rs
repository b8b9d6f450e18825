//! HTTP middleware for request processing.
//!
//! Tags every request with an id, writes the access log line, and feeds the
//! per-route request counters.
pub mod request_log;

pub use request_log::{track_requests, REQUEST_ID_HEADER, UNMATCHED_PATH};
