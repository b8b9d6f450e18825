//! `GET /metrics`: Prometheus text exposition.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use crate::AppState;

const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Renders request and webhook outcome counters.
pub async fn metrics(State(state): State<AppState>) -> Response {
    let body = state.counters.render();

    (StatusCode::OK, [(header::CONTENT_TYPE, CONTENT_TYPE)], body).into_response()
}
