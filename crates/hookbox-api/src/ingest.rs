//! Webhook ingestion pipeline.
//!
//! Verifies the signature over the raw body, normalizes the payload, and
//! stores the message at most once per `message_id`. Every attempt emits an
//! [`IngestEvent`] so counters see exactly one outcome per request.

use std::sync::Arc;

use hookbox_core::{
    Clock, EventHandler, HookboxError, IngestEvent, NewMessage, Storage, WebhookPayload,
};
use tracing::{debug, error, info, instrument, warn, Span};

use crate::crypto::{verify_signature, WebhookSecret};

/// Successful ingestion outcome.
///
/// Both variants map to the same HTTP response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// The message was stored by this request.
    Created,
    /// The message id was already stored.
    Duplicate,
}

/// Runs the ingestion pipeline against a message store.
pub struct Ingestor {
    storage: Arc<Storage>,
    secret: WebhookSecret,
    clock: Arc<dyn Clock>,
    events: Arc<dyn EventHandler>,
}

impl Ingestor {
    /// Creates an ingestor publishing outcomes to `events`.
    pub fn new(
        storage: Arc<Storage>,
        secret: WebhookSecret,
        clock: Arc<dyn Clock>,
        events: Arc<dyn EventHandler>,
    ) -> Self {
        Self { storage, secret, clock, events }
    }

    /// Ingests one webhook delivery.
    ///
    /// Order matters: signature first so unsigned garbage is never parsed,
    /// then validation, then the idempotent write.
    ///
    /// # Errors
    ///
    /// - `HookboxError::InvalidSignature` for a missing or wrong signature
    /// - `HookboxError::Validation` for a malformed payload
    /// - `HookboxError::StorageUnavailable` if the store fails
    #[instrument(
        name = "ingest",
        skip_all,
        fields(body_len = body.len(), message_id = tracing::field::Empty)
    )]
    pub async fn ingest(
        &self,
        body: &[u8],
        signature: Option<&str>,
    ) -> Result<IngestOutcome, HookboxError> {
        if let Err(e) = verify_signature(body, signature, &self.secret) {
            warn!(reason = %e, result = "invalid_signature", "Rejected webhook signature");
            self.events.handle_event(&IngestEvent::InvalidSignature);
            return Err(HookboxError::InvalidSignature);
        }

        let message = match WebhookPayload::parse(body).and_then(WebhookPayload::normalize) {
            Ok(message) => message,
            Err(err) => {
                info!(reason = %err.detail(), result = "validation_error", "Rejected payload");
                self.events.handle_event(&IngestEvent::ValidationFailed { reason: err.detail() });
                return Err(err);
            },
        };

        Span::current().record("message_id", message.message_id.as_str());
        self.store(message).await
    }

    async fn store(&self, message: NewMessage) -> Result<IngestOutcome, HookboxError> {
        let existing = self.storage.messages.find_by_id(&message.message_id).await.map_err(|e| {
            error!(error = %e, "Failed to look up message");
            HookboxError::from(e)
        })?;

        if existing.is_some() {
            return Ok(self.duplicate(message.message_id));
        }

        let record = message.stamp(self.clock.utc_timestamp());

        match self.storage.messages.insert(&record).await {
            Ok(()) => {
                info!(
                    message_id = %record.message_id,
                    dup = false,
                    result = "created",
                    "Message stored"
                );
                self.events.handle_event(&IngestEvent::Created { message_id: record.message_id });
                Ok(IngestOutcome::Created)
            },
            Err(e) if e.is_already_exists() => {
                debug!(message_id = %record.message_id, "Lost insert race to a concurrent writer");
                Ok(self.duplicate(record.message_id))
            },
            Err(e) => {
                error!(error = %e, "Failed to persist message");
                Err(e.into())
            },
        }
    }

    fn duplicate(&self, message_id: String) -> IngestOutcome {
        info!(message_id = %message_id, dup = true, result = "duplicate", "Duplicate message");
        self.events.handle_event(&IngestEvent::Duplicate { message_id });
        IngestOutcome::Duplicate
    }
}
