//! Core domain models, storage, and observability primitives.
//!
//! Provides the message model, the wire-to-storage normalization step, the
//! SQLite-backed message store, and the counters collaborator that the
//! ingestion path reports into. The HTTP layer depends on these types and
//! never talks to the database directly.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod events;
pub mod metrics;
pub mod models;
pub mod storage;
pub mod time;

pub use error::{CoreError, HookboxError, Result};
pub use events::{EventHandler, IngestEvent, MulticastEventHandler};
pub use metrics::{Counters, WebhookResult};
pub use models::{
    Message, MessageFilter, MessagePage, MessageStats, NewMessage, SenderCount, WebhookPayload,
};
pub use storage::Storage;
pub use time::{Clock, RealClock, TestClock};
