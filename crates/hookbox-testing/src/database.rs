//! Isolated SQLite databases for tests.
//!
//! Every `TestDatabase` is private to one test: either an in-memory database
//! held open by a single pooled connection, or a file in a temporary
//! directory that is removed on drop.

use anyhow::{Context, Result};
use hookbox_core::storage::connect_options;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use tempfile::TempDir;

/// Connections in a file-backed pool; enough for concurrent writers to race.
const FILE_POOL_SIZE: u32 = 8;

/// Test database handle.
pub struct TestDatabase {
    pool: SqlitePool,
    _dir: Option<TempDir>,
}

impl TestDatabase {
    /// Creates an in-memory database.
    ///
    /// The pool keeps exactly one connection alive forever, since an
    /// in-memory SQLite database disappears with its last connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be opened.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(connect_options("sqlite::memory:")?)
            .await
            .context("failed to open in-memory database")?;

        Ok(Self { pool, _dir: None })
    }

    /// Creates a database file inside a fresh temporary directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or database cannot be created.
    pub async fn file_backed() -> Result<Self> {
        let dir = tempfile::tempdir().context("failed to create temp dir")?;
        let path = dir.path().join("hookbox-test.db");
        let url = format!("sqlite://{}", path.display());

        let pool = SqlitePoolOptions::new()
            .max_connections(FILE_POOL_SIZE)
            .connect_with(connect_options(&url)?)
            .await
            .with_context(|| format!("failed to open {url}"))?;

        Ok(Self { pool, _dir: Some(dir) })
    }

    /// Returns a clone of the pool.
    pub fn pool(&self) -> SqlitePool {
        self.pool.clone()
    }
}
