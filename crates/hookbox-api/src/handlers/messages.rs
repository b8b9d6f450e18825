//! `GET /messages`: paginated, filtered message listing.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use hookbox_core::{HookboxError, Message, MessageFilter};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::error::ApiError;
use crate::AppState;

/// Page size when `limit` is omitted.
pub const DEFAULT_LIMIT: i64 = 50;

/// Largest accepted page size.
pub const MAX_LIMIT: i64 = 100;

/// Query string for `GET /messages`.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    /// Page size, 1..=100.
    pub limit: Option<i64>,
    /// Rows to skip, at least 0.
    pub offset: Option<i64>,
    /// Exact sender match.
    pub from: Option<String>,
    /// Inclusive lower bound on `ts`.
    pub since: Option<String>,
    /// Case-sensitive substring of `text`.
    pub q: Option<String>,
}

impl ListParams {
    /// Validates the pagination window, returning `(limit, offset)`.
    ///
    /// # Errors
    ///
    /// Returns `HookboxError::InvalidQuery` when either value is out of
    /// range.
    pub fn window(&self) -> Result<(i64, i64), HookboxError> {
        let limit = self.limit.unwrap_or(DEFAULT_LIMIT);
        if !(1..=MAX_LIMIT).contains(&limit) {
            return Err(HookboxError::invalid_query(format!(
                "limit must be between 1 and {MAX_LIMIT}"
            )));
        }

        let offset = self.offset.unwrap_or(0);
        if offset < 0 {
            return Err(HookboxError::invalid_query("offset must be >= 0"));
        }

        Ok((limit, offset))
    }

    fn filter(self) -> MessageFilter {
        MessageFilter { from: self.from, since: self.since, text_contains: self.q }
    }
}

/// A message as exposed over HTTP, with wire field names.
#[derive(Debug, Serialize)]
pub struct MessageView {
    /// Caller-assigned identifier.
    pub message_id: String,
    /// Sender.
    pub from: String,
    /// Recipient.
    pub to: String,
    /// Sender-supplied timestamp.
    pub ts: String,
    /// Body, `null` when absent.
    pub text: Option<String>,
}

impl From<Message> for MessageView {
    fn from(message: Message) -> Self {
        Self {
            message_id: message.message_id,
            from: message.from_msisdn,
            to: message.to_msisdn,
            ts: message.ts,
            text: message.text,
        }
    }
}

/// Response body for `GET /messages`.
#[derive(Debug, Serialize)]
pub struct MessageListResponse {
    /// The requested page.
    pub data: Vec<MessageView>,
    /// Matching rows before pagination.
    pub total: i64,
    /// Effective page size.
    pub limit: i64,
    /// Effective offset.
    pub offset: i64,
}

/// Lists stored messages ascending by `(ts, message_id)`.
///
/// # Errors
///
/// - 422: malformed or out-of-range query parameters
/// - 503: storage unavailable
#[instrument(name = "list_messages", skip_all)]
pub async fn list_messages(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<MessageListResponse>, ApiError> {
    let Query(params) = params.map_err(|e| HookboxError::invalid_query(e.body_text()))?;
    let (limit, offset) = params.window()?;
    let filter = params.filter();

    let page =
        state.storage.messages.list(&filter, limit, offset).await.map_err(HookboxError::from)?;
    debug!(total = page.total, returned = page.items.len(), "Listed messages");

    Ok(Json(MessageListResponse {
        data: page.items.into_iter().map(MessageView::from).collect(),
        total: page.total,
        limit,
        offset,
    }))
}
