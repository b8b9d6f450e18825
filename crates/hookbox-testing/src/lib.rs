//! Test infrastructure for deterministic hookbox tests.
//!
//! `TestEnv` wires an isolated SQLite database, a pinned `TestClock`, and
//! the production router together so tests exercise the same code paths as
//! the binary without binding a socket.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

use std::{
    sync::Arc,
    time::{Duration, UNIX_EPOCH},
};

use anyhow::{Context, Result};
use axum::Router;
use bytes::Bytes;
use hookbox_api::{crypto::sign_payload, create_router, AppState, RequestLimits, WebhookSecret};
use hookbox_core::{Counters, EventHandler, Storage};
pub use hookbox_core::{Clock, TestClock};
use sqlx::SqlitePool;

pub mod database;
pub mod fixtures;
pub mod http;

pub use database::TestDatabase;
pub use fixtures::MessageBuilder;
pub use http::{get_request, send, webhook_request, TestResponse};

/// Secret every `TestEnv` signs and verifies with.
pub const TEST_SECRET: &str = "testsecret";

/// Seconds since the epoch for 2025-01-01T10:00:00Z, the default clock start.
pub const TEST_EPOCH_SECS: u64 = 1_735_725_600;

/// Builder for configuring a `TestEnv`.
#[derive(Default)]
pub struct TestEnvBuilder {
    file_backed: bool,
    limits: Option<RequestLimits>,
    subscribers: Vec<Arc<dyn EventHandler>>,
}

impl TestEnvBuilder {
    /// Creates a builder for an in-memory environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a temporary database file with a multi-connection pool.
    ///
    /// Needed by tests where requests must actually run concurrently.
    #[must_use]
    pub fn file_backed(mut self) -> Self {
        self.file_backed = true;
        self
    }

    /// Overrides the router's request limits.
    #[must_use]
    pub fn limits(mut self, limits: RequestLimits) -> Self {
        self.limits = Some(limits);
        self
    }

    /// Adds an ingestion event subscriber next to the counters.
    #[must_use]
    pub fn subscriber(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.subscribers.push(handler);
        self
    }

    /// Builds the environment and creates the schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub async fn build(self) -> Result<TestEnv> {
        let database = if self.file_backed {
            TestDatabase::file_backed().await?
        } else {
            TestDatabase::in_memory().await?
        };

        let storage = Arc::new(Storage::new(database.pool()));
        storage.ensure_schema().await.context("failed to create schema")?;

        let clock = TestClock::with_start_time(UNIX_EPOCH + Duration::from_secs(TEST_EPOCH_SECS));
        let secret = WebhookSecret::new(TEST_SECRET).context("invalid test secret")?;

        let mut state = AppState::with_subscribers(
            storage.clone(),
            secret.clone(),
            Arc::new(clock.clone()),
            self.subscribers,
        );
        if let Some(limits) = self.limits {
            state = state.with_limits(limits);
        }

        let router = create_router(state.clone());

        Ok(TestEnv { clock, database, storage, secret, state, router })
    }
}

/// Isolated environment for integration tests.
pub struct TestEnv {
    /// Deterministic clock shared with the ingestion pipeline
    pub clock: TestClock,
    database: TestDatabase,
    storage: Arc<Storage>,
    secret: WebhookSecret,
    state: AppState,
    router: Router,
}

impl TestEnv {
    /// Creates an environment backed by an in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if setup fails.
    pub async fn new() -> Result<Self> {
        TestEnvBuilder::new().build().await
    }

    /// Creates an environment backed by a temporary database file.
    ///
    /// # Errors
    ///
    /// Returns an error if setup fails.
    pub async fn new_file_backed() -> Result<Self> {
        TestEnvBuilder::new().file_backed().build().await
    }

    /// Returns a builder for custom environments.
    pub fn builder() -> TestEnvBuilder {
        TestEnvBuilder::new()
    }

    /// Database pool.
    pub fn pool(&self) -> SqlitePool {
        self.database.pool()
    }

    /// Storage layer.
    pub fn storage(&self) -> &Arc<Storage> {
        &self.storage
    }

    /// Counters fed by the router and the ingestion pipeline.
    pub fn counters(&self) -> &Arc<Counters> {
        &self.state.counters
    }

    /// Application state behind the router.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Router under test.
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Hex HMAC-SHA256 of `body` under the test secret.
    pub fn sign(&self, body: &[u8]) -> String {
        sign_payload(body, &self.secret).expect("test secret is a valid HMAC key")
    }

    /// Sends a correctly signed webhook.
    ///
    /// # Errors
    ///
    /// Returns an error if the router call fails.
    pub async fn post_webhook(&self, body: impl Into<Bytes>) -> Result<TestResponse> {
        let body = body.into();
        let signature = self.sign(&body);
        self.post_webhook_with_signature(body, Some(&signature)).await
    }

    /// Sends a webhook with an arbitrary or missing signature.
    ///
    /// # Errors
    ///
    /// Returns an error if the router call fails.
    pub async fn post_webhook_with_signature(
        &self,
        body: impl Into<Bytes>,
        signature: Option<&str>,
    ) -> Result<TestResponse> {
        send(&self.router, webhook_request(body, signature)).await
    }

    /// Sends a `GET` request.
    ///
    /// # Errors
    ///
    /// Returns an error if the router call fails.
    pub async fn get(&self, uri: &str) -> Result<TestResponse> {
        send(&self.router, get_request(uri)).await
    }

    /// Number of stored messages.
    ///
    /// # Errors
    ///
    /// Returns an error if the count query fails.
    pub async fn message_count(&self) -> Result<i64> {
        Ok(self.storage.messages.count().await?)
    }
}
