//! `GET /stats`: aggregate message statistics.

use axum::{extract::State, Json};
use hookbox_core::{HookboxError, MessageStats, SenderCount};
use serde::Serialize;
use tracing::instrument;

use super::error::ApiError;
use crate::AppState;

/// Per-sender message count.
#[derive(Debug, Serialize)]
pub struct SenderView {
    /// Sender.
    pub from: String,
    /// Messages stored from this sender.
    pub count: i64,
}

impl From<SenderCount> for SenderView {
    fn from(sender: SenderCount) -> Self {
        Self { from: sender.from_msisdn, count: sender.count }
    }
}

/// Response body for `GET /stats`.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    /// All stored messages.
    pub total_messages: i64,
    /// Distinct senders.
    pub senders_count: i64,
    /// Top senders, busiest first.
    pub messages_per_sender: Vec<SenderView>,
    /// Smallest `ts`, `null` when empty.
    pub first_message_ts: Option<String>,
    /// Largest `ts`, `null` when empty.
    pub last_message_ts: Option<String>,
}

impl From<MessageStats> for StatsResponse {
    fn from(stats: MessageStats) -> Self {
        Self {
            total_messages: stats.total_messages,
            senders_count: stats.senders_count,
            messages_per_sender: stats.top_senders.into_iter().map(SenderView::from).collect(),
            first_message_ts: stats.first_ts,
            last_message_ts: stats.last_ts,
        }
    }
}

/// Returns aggregate statistics over all stored messages.
///
/// # Errors
///
/// Returns 503 if storage is unavailable.
#[instrument(name = "get_stats", skip_all)]
pub async fn get_stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, ApiError> {
    let stats = state.storage.messages.stats().await.map_err(HookboxError::from)?;

    Ok(Json(StatsResponse::from(stats)))
}
