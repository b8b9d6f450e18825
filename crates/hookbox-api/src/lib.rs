//! Hookbox HTTP API.
//!
//! Signed webhook ingestion plus read-only query, health, and metrics
//! endpoints over a SQLite message store.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::{sync::Arc, time::Duration};

use hookbox_core::{Clock, Counters, EventHandler, MulticastEventHandler, Storage};

pub mod config;
pub mod crypto;
pub mod handlers;
pub mod ingest;
pub mod middleware;
pub mod server;

pub use config::{Config, LogFormat};
pub use crypto::WebhookSecret;
pub use ingest::{IngestOutcome, Ingestor};
pub use server::{create_router, start_server};

/// Per-request limits applied by the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestLimits {
    /// Time allowed for a request before it is aborted with 408.
    pub request_timeout: Duration,
    /// Largest accepted request body; larger bodies get 413.
    pub max_payload_bytes: usize,
}

impl Default for RequestLimits {
    fn default() -> Self {
        Self { request_timeout: Duration::from_secs(30), max_payload_bytes: 1024 * 1024 }
    }
}

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Message store.
    pub storage: Arc<Storage>,
    /// Ingestion pipeline.
    pub ingestor: Arc<Ingestor>,
    /// Request and outcome counters.
    pub counters: Arc<Counters>,
    /// Time source for timestamps and health timings.
    pub clock: Arc<dyn Clock>,
    /// Shared webhook secret.
    pub secret: WebhookSecret,
    /// Body size and timeout limits.
    pub limits: RequestLimits,
}

impl AppState {
    /// Builds state with fresh counters as the only event subscriber.
    pub fn new(storage: Arc<Storage>, secret: WebhookSecret, clock: Arc<dyn Clock>) -> Self {
        Self::with_subscribers(storage, secret, clock, Vec::new())
    }

    /// Builds state whose ingestion events also reach `subscribers`.
    ///
    /// Counters always receive events first.
    pub fn with_subscribers(
        storage: Arc<Storage>,
        secret: WebhookSecret,
        clock: Arc<dyn Clock>,
        subscribers: Vec<Arc<dyn EventHandler>>,
    ) -> Self {
        let counters = Arc::new(Counters::new());

        let mut events = MulticastEventHandler::new();
        events.add_subscriber(counters.clone());
        for subscriber in subscribers {
            events.add_subscriber(subscriber);
        }

        let ingestor = Arc::new(Ingestor::new(
            storage.clone(),
            secret.clone(),
            clock.clone(),
            Arc::new(events),
        ));

        Self { storage, ingestor, counters, clock, secret, limits: RequestLimits::default() }
    }

    /// Replaces the default request limits.
    #[must_use]
    pub fn with_limits(mut self, limits: RequestLimits) -> Self {
        self.limits = limits;
        self
    }
}
