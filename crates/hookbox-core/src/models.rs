//! Message model and the wire-to-storage normalization step.
//!
//! Webhook senders use `from`/`to`; storage uses `from_msisdn`/`to_msisdn`.
//! `WebhookPayload` is the wire shape and `NewMessage` the normalized one.
//! The rename happens in exactly one place, `WebhookPayload::normalize`.

use serde::{Deserialize, Serialize};

use crate::error::HookboxError;

/// A persisted inbound message.
///
/// Created once on first successful ingestion of its `message_id` and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Message {
    /// Sender-assigned identifier; the idempotency key.
    pub message_id: String,

    /// Sender MSISDN.
    pub from_msisdn: String,

    /// Recipient MSISDN.
    pub to_msisdn: String,

    /// Caller-supplied timestamp, stored verbatim and used as the sort key.
    pub ts: String,

    /// Optional message body.
    pub text: Option<String>,

    /// Server ingestion instant, UTC ISO-8601 with trailing `Z`.
    pub created_at: String,
}

/// A normalized message that has not been stamped with `created_at` yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    /// Sender-assigned identifier, guaranteed non-empty.
    pub message_id: String,
    /// Sender MSISDN.
    pub from_msisdn: String,
    /// Recipient MSISDN.
    pub to_msisdn: String,
    /// Caller-supplied timestamp.
    pub ts: String,
    /// Optional message body.
    pub text: Option<String>,
}

impl NewMessage {
    /// Assigns the ingestion timestamp, producing the record to persist.
    pub fn stamp(self, created_at: impl Into<String>) -> Message {
        Message {
            message_id: self.message_id,
            from_msisdn: self.from_msisdn,
            to_msisdn: self.to_msisdn,
            ts: self.ts,
            text: self.text,
            created_at: created_at.into(),
        }
    }
}

/// Inbound webhook body in wire vocabulary.
///
/// Every field is optional at this stage so that missing keys surface as
/// validation reasons instead of opaque deserialization errors. Unknown keys
/// are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct WebhookPayload {
    /// Sender-assigned identifier.
    #[serde(default)]
    pub message_id: Option<String>,
    /// Sender MSISDN.
    #[serde(default)]
    pub from: Option<String>,
    /// Recipient MSISDN.
    #[serde(default)]
    pub to: Option<String>,
    /// Caller-supplied timestamp.
    #[serde(default)]
    pub ts: Option<String>,
    /// Optional message body.
    #[serde(default)]
    pub text: Option<String>,
}

impl WebhookPayload {
    /// Parses a raw request body.
    ///
    /// Only call this after the signature over the same bytes has been
    /// verified.
    ///
    /// # Errors
    ///
    /// Returns `HookboxError::Validation` if the body is not a JSON object
    /// or a known field has the wrong type.
    pub fn parse(body: &[u8]) -> Result<Self, HookboxError> {
        let value: serde_json::Value = serde_json::from_slice(body)
            .map_err(|e| HookboxError::validation(format!("Invalid JSON body: {e}")))?;

        if !value.is_object() {
            return Err(HookboxError::validation("Payload must be a JSON object"));
        }

        serde_json::from_value(value).map_err(|e| HookboxError::validation(e.to_string()))
    }

    /// Maps wire names onto storage names and checks required fields.
    ///
    /// Checks run in the order `from`, `to`, `message_id`, `ts`; the first
    /// failure is reported.
    ///
    /// # Errors
    ///
    /// Returns `HookboxError::Validation` naming the first missing field.
    pub fn normalize(self) -> Result<NewMessage, HookboxError> {
        let from_msisdn =
            self.from.ok_or_else(|| HookboxError::validation("Missing 'from' field"))?;
        let to_msisdn = self.to.ok_or_else(|| HookboxError::validation("Missing 'to' field"))?;

        let message_id = match self.message_id {
            Some(id) if !id.is_empty() => id,
            _ => return Err(HookboxError::validation("Empty message_id")),
        };

        let ts = self.ts.ok_or_else(|| HookboxError::validation("Missing 'ts' field"))?;

        Ok(NewMessage { message_id, from_msisdn, to_msisdn, ts, text: self.text })
    }
}

/// Conjunctive filters for listing messages.
///
/// Empty strings are treated the same as absent filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageFilter {
    /// Exact match on `from_msisdn`.
    pub from: Option<String>,
    /// Inclusive lexicographic lower bound on `ts`.
    pub since: Option<String>,
    /// Case-sensitive substring of `text`.
    pub text_contains: Option<String>,
}

impl MessageFilter {
    /// Drops empty filter values so they do not constrain the query.
    #[must_use]
    pub fn normalized(self) -> Self {
        fn non_empty(value: Option<String>) -> Option<String> {
            value.filter(|v| !v.is_empty())
        }

        Self {
            from: non_empty(self.from),
            since: non_empty(self.since),
            text_contains: non_empty(self.text_contains),
        }
    }
}

/// One page of a filtered listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessagePage {
    /// Messages on this page, ascending by `(ts, message_id)`.
    pub items: Vec<Message>,
    /// Size of the filtered set before pagination.
    pub total: i64,
}

/// Per-sender message volume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct SenderCount {
    /// Sender MSISDN.
    pub from_msisdn: String,
    /// Number of stored messages from this sender.
    pub count: i64,
}

/// Aggregate statistics over all stored messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageStats {
    /// Number of stored messages.
    pub total_messages: i64,
    /// Number of distinct senders.
    pub senders_count: i64,
    /// Up to ten senders by descending volume, ties by sender ascending.
    pub top_senders: Vec<SenderCount>,
    /// Smallest `ts`, absent when the store is empty.
    pub first_ts: Option<String>,
    /// Largest `ts`, absent when the store is empty.
    pub last_ts: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reason(err: HookboxError) -> String {
        match err {
            HookboxError::Validation { reason } => reason,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn normalize_renames_wire_fields() {
        let payload = WebhookPayload::parse(
            br#"{"message_id":"m1","from":"+1","to":"+2","ts":"2025-01-01T10:00:00Z","text":"hi"}"#,
        )
        .unwrap();

        let message = payload.normalize().unwrap();

        assert_eq!(message.message_id, "m1");
        assert_eq!(message.from_msisdn, "+1");
        assert_eq!(message.to_msisdn, "+2");
        assert_eq!(message.ts, "2025-01-01T10:00:00Z");
        assert_eq!(message.text.as_deref(), Some("hi"));
    }

    #[test]
    fn text_may_be_null_or_absent() {
        let with_null =
            WebhookPayload::parse(br#"{"message_id":"m1","from":"+1","to":"+2","ts":"t","text":null}"#)
                .unwrap()
                .normalize()
                .unwrap();
        let without =
            WebhookPayload::parse(br#"{"message_id":"m1","from":"+1","to":"+2","ts":"t"}"#)
                .unwrap()
                .normalize()
                .unwrap();

        assert_eq!(with_null.text, None);
        assert_eq!(without.text, None);
    }

    #[test]
    fn missing_from_is_reported_first() {
        let err = WebhookPayload::parse(br#"{"to":"+2"}"#).unwrap().normalize().unwrap_err();
        assert_eq!(reason(err), "Missing 'from' field");
    }

    #[test]
    fn missing_to_is_reported() {
        let err = WebhookPayload::parse(br#"{"message_id":"m1","from":"+1","ts":"t"}"#)
            .unwrap()
            .normalize()
            .unwrap_err();
        assert_eq!(reason(err), "Missing 'to' field");
    }

    #[test]
    fn empty_and_missing_message_id_are_rejected() {
        for body in [
            br#"{"message_id":"","from":"+1","to":"+2","ts":"t"}"#.as_slice(),
            br#"{"from":"+1","to":"+2","ts":"t"}"#.as_slice(),
        ] {
            let err = WebhookPayload::parse(body).unwrap().normalize().unwrap_err();
            assert_eq!(reason(err), "Empty message_id");
        }
    }

    #[test]
    fn missing_ts_is_reported() {
        let err = WebhookPayload::parse(br#"{"message_id":"m1","from":"+1","to":"+2"}"#)
            .unwrap()
            .normalize()
            .unwrap_err();
        assert_eq!(reason(err), "Missing 'ts' field");
    }

    #[test]
    fn non_object_bodies_are_rejected() {
        assert!(reason(WebhookPayload::parse(b"[1,2,3]").unwrap_err()).contains("JSON object"));
        assert!(reason(WebhookPayload::parse(b"not json").unwrap_err()).contains("Invalid JSON"));
    }

    #[test]
    fn wrong_field_type_is_a_validation_error() {
        let err = WebhookPayload::parse(br#"{"message_id":"m1","from":5,"to":"+2","ts":"t"}"#)
            .unwrap_err();
        assert!(matches!(err, HookboxError::Validation { .. }));
    }

    #[test]
    fn empty_filters_are_dropped() {
        let filter = MessageFilter {
            from: Some(String::new()),
            since: Some("2025-01-01".into()),
            text_contains: Some(String::new()),
        }
        .normalized();

        assert_eq!(filter.from, None);
        assert_eq!(filter.since.as_deref(), Some("2025-01-01"));
        assert_eq!(filter.text_contains, None);
    }
}
