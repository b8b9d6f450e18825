//! Request id, access logging, and HTTP request counting.

use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request, State},
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::AppState;

/// Response header carrying the request id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Counter label for requests that matched no route.
pub const UNMATCHED_PATH: &str = "unmatched";

/// Assigns a request id, logs one line per request, and counts it.
///
/// The counter label is the matched route template, or [`UNMATCHED_PATH`]
/// when no route matched, so arbitrary paths never create new series. The
/// access log keeps the raw path. Handler spans nest under the request span
/// and inherit its `request_id`.
pub async fn track_requests(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map_or(UNMATCHED_PATH, MatchedPath::as_str)
        .to_string();

    let start = Instant::now();
    let span = info_span!("request", request_id = %request_id);
    let mut response = next.run(req).instrument(span).await;
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;

    let status = response.status().as_u16();
    state.counters.record_http(&route, status);

    info!(
        request_id = %request_id,
        method = %method,
        path = %path,
        status,
        latency_ms,
        "request completed"
    );

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}
