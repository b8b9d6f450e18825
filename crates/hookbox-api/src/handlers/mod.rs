//! HTTP request handlers for the hookbox API.
//!
//! Failing handlers return [`ApiError`], which renders the error taxonomy as
//! a status code plus a `{"detail": ...}` body.

pub mod error;
pub mod health;
pub mod messages;
pub mod metrics;
pub mod stats;
pub mod webhook;

pub use error::{ApiError, ErrorResponse};
pub use health::{health_check, liveness_check, readiness_check};
pub use messages::list_messages;
pub use metrics::metrics;
pub use stats::get_stats;
pub use webhook::ingest_webhook;
