//! Ingestion events for decoupled observability.
//!
//! The ingestion path reports each outcome as an `IngestEvent` and moves on.
//! Subscribers (counters, audit hooks in tests) implement `EventHandler`.
//!
//! ```text
//! ┌─────────────────┐   IngestEvent   ┌────────────────────┐
//! │ Ingestor        │ ───────────────▶│ MulticastHandler   │
//! │ (Producer)      │                 │ (Event Dispatcher) │
//! └─────────────────┘                 └────────────────────┘
//!                                               │
//!                                               ▼
//!                                      ┌─────────────────┐
//!                                      │ Counters        │
//!                                      └─────────────────┘
//! ```

use std::sync::Arc;

use crate::metrics::WebhookResult;

/// Outcome of a single webhook ingestion attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestEvent {
    /// A new message was stored.
    Created {
        /// Identifier of the stored message
        message_id: String,
    },

    /// The message id was already stored; nothing was written.
    Duplicate {
        /// Identifier that was seen before
        message_id: String,
    },

    /// Signature header missing or wrong.
    InvalidSignature,

    /// Signed payload failed validation.
    ValidationFailed {
        /// Reason returned to the caller
        reason: String,
    },
}

impl IngestEvent {
    /// Returns the counter category for this event.
    pub const fn result(&self) -> WebhookResult {
        match self {
            Self::Created { .. } => WebhookResult::Created,
            Self::Duplicate { .. } => WebhookResult::Duplicate,
            Self::InvalidSignature => WebhookResult::InvalidSignature,
            Self::ValidationFailed { .. } => WebhookResult::ValidationError,
        }
    }
}

/// Trait for handling ingestion events.
///
/// Implementations must return promptly and must not fail: the request that
/// produced the event has already decided its response.
pub trait EventHandler: Send + Sync + std::fmt::Debug {
    /// Handles an ingestion event.
    fn handle_event(&self, event: &IngestEvent);
}

/// Forwards every event to each registered subscriber in order.
#[derive(Debug, Clone, Default)]
pub struct MulticastEventHandler {
    handlers: Vec<Arc<dyn EventHandler>>,
}

impl MulticastEventHandler {
    /// Creates a new multicast handler with no subscribers.
    pub fn new() -> Self {
        Self { handlers: Vec::new() }
    }

    /// Adds a subscriber.
    pub fn add_subscriber(&mut self, handler: Arc<dyn EventHandler>) {
        self.handlers.push(handler);
    }

    /// Returns the number of registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.handlers.len()
    }
}

impl EventHandler for MulticastEventHandler {
    fn handle_event(&self, event: &IngestEvent) {
        for handler in &self.handlers {
            handler.handle_event(event);
        }
    }
}
