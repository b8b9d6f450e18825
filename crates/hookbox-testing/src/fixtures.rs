//! Test data builders for webhook payloads and stored messages.

use bytes::Bytes;
use hookbox_core::Message;
use serde_json::{Map, Value};
use uuid::Uuid;

/// `created_at` used for messages written directly to storage.
pub const FIXTURE_CREATED_AT: &str = "2025-01-01T00:00:00.000000Z";

/// Builder for webhook payloads.
///
/// Unset fields are left out of the JSON entirely, which is how tests
/// exercise the validation paths.
#[derive(Debug, Clone, Default)]
pub struct MessageBuilder {
    message_id: Option<String>,
    from: Option<String>,
    to: Option<String>,
    ts: Option<String>,
    text: Option<String>,
}

impl MessageBuilder {
    /// Creates a builder with every field unset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder for a complete, valid payload with a unique id.
    pub fn with_defaults() -> Self {
        Self {
            message_id: Some(format!("m-{}", Uuid::new_v4().simple())),
            from: Some("+919876543210".to_string()),
            to: Some("+14155550100".to_string()),
            ts: Some("2025-01-15T10:00:00Z".to_string()),
            text: Some("Hello".to_string()),
        }
    }

    /// Sets the message id.
    #[must_use]
    pub fn message_id(mut self, id: impl Into<String>) -> Self {
        self.message_id = Some(id.into());
        self
    }

    /// Sets the sender.
    #[must_use]
    pub fn from(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }

    /// Sets the recipient.
    #[must_use]
    pub fn to(mut self, to: impl Into<String>) -> Self {
        self.to = Some(to.into());
        self
    }

    /// Sets the sender timestamp.
    #[must_use]
    pub fn ts(mut self, ts: impl Into<String>) -> Self {
        self.ts = Some(ts.into());
        self
    }

    /// Sets the text body.
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Drops the sender field.
    #[must_use]
    pub fn without_from(mut self) -> Self {
        self.from = None;
        self
    }

    /// Drops the recipient field.
    #[must_use]
    pub fn without_to(mut self) -> Self {
        self.to = None;
        self
    }

    /// Drops the text field.
    #[must_use]
    pub fn without_text(mut self) -> Self {
        self.text = None;
        self
    }

    /// Wire JSON with `from`/`to` field names.
    pub fn to_json(&self) -> Value {
        let mut object = Map::new();
        let fields = [
            ("message_id", &self.message_id),
            ("from", &self.from),
            ("to", &self.to),
            ("ts", &self.ts),
            ("text", &self.text),
        ];
        for (key, value) in fields {
            if let Some(value) = value {
                object.insert(key.to_string(), Value::String(value.clone()));
            }
        }
        Value::Object(object)
    }

    /// Serialized request body.
    pub fn body(&self) -> Bytes {
        Bytes::from(self.to_json().to_string())
    }

    /// Storage record for seeding the database directly.
    pub fn into_message(self) -> Message {
        Message {
            message_id: self.message_id.unwrap_or_default(),
            from_msisdn: self.from.unwrap_or_default(),
            to_msisdn: self.to.unwrap_or_default(),
            ts: self.ts.unwrap_or_default(),
            text: self.text,
            created_at: FIXTURE_CREATED_AT.to_string(),
        }
    }
}
