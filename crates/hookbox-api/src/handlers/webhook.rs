//! `POST /webhook`: signed message ingestion.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde::Serialize;
use tracing::instrument;

use super::error::ApiError;
use crate::AppState;

/// Header carrying the hex HMAC-SHA256 of the body.
pub const SIGNATURE_HEADER: &str = "x-signature";

/// Acknowledgement body, identical for new and duplicate messages.
#[derive(Debug, Serialize)]
pub struct IngestResponse {
    /// Always `"ok"`.
    pub status: &'static str,
}

/// Ingests a signed webhook.
///
/// The body is taken as raw bytes so the signature covers exactly what was
/// sent. A header that is not visible ASCII counts as missing.
///
/// # Errors
///
/// - 401: missing or invalid signature
/// - 422: payload failed validation
/// - 503: storage unavailable
#[instrument(name = "ingest_webhook", skip_all, fields(body_len = body.len()))]
pub async fn ingest_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());

    state.ingestor.ingest(&body, signature).await?;

    Ok((StatusCode::OK, Json(IngestResponse { status: "ok" })).into_response())
}
