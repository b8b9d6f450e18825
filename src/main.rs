//! Hookbox webhook sink.
//!
//! Main entry point for the hookbox server. Loads configuration, prepares
//! the SQLite store, and serves HTTP until a shutdown signal arrives.

use std::{path::Path, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use hookbox_api::{AppState, Config, LogFormat};
use hookbox_core::{storage::connect_options, RealClock, Storage};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;
    init_tracing(&config)?;

    info!("Starting hookbox webhook sink");

    let server_addr = config.parse_server_addr()?;
    info!(
        database_url = %config.database_url_masked(),
        server_addr = %server_addr,
        max_connections = config.database_max_connections,
        log_format = ?config.log_format,
        "Configuration loaded"
    );

    let secret = config.webhook_secret()?;

    let db_pool = create_database_pool(&config).await?;
    info!("Database connection pool established");

    let storage = Arc::new(Storage::new(db_pool.clone()));
    storage.ensure_schema().await.context("Failed to create database schema")?;
    info!("Database schema ready");

    let state = AppState::new(storage, secret, Arc::new(RealClock::new()))
        .with_limits(config.request_limits());

    hookbox_api::start_server(state, server_addr).await.context("HTTP server failed")?;

    db_pool.close().await;
    info!("Database connections closed");

    info!("Hookbox shutdown complete");
    Ok(())
}

/// Initializes tracing from the configured filter and output format.
fn init_tracing(config: &Config) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_new(&config.rust_log)
        .with_context(|| format!("Invalid RUST_LOG value: {}", config.rust_log))?;

    let registry = tracing_subscriber::registry().with(filter);

    match config.log_format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(true).with_target(true))
            .try_init(),
        LogFormat::Pretty => registry
            .with(fmt::layer().pretty().with_target(true).with_line_number(true))
            .try_init(),
    }
    .context("Failed to install tracing subscriber")
}

/// Creates the database connection pool with retry logic.
async fn create_database_pool(config: &Config) -> Result<sqlx::SqlitePool> {
    const MAX_RETRIES: u32 = 5;
    const RETRY_DELAY: Duration = Duration::from_secs(2);

    let options = connect_options(&config.database_url)?;
    ensure_parent_dir(&options)?;

    let mut retries = 0;
    loop {
        match SqlitePoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(config.database_acquire_timeout())
            .connect_with(options.clone())
            .await
        {
            Ok(pool) => {
                sqlx::query("SELECT 1")
                    .fetch_one(&pool)
                    .await
                    .context("Failed to verify database connection")?;

                return Ok(pool);
            },
            Err(e) if retries < MAX_RETRIES => {
                retries += 1;
                warn!(
                    attempt = retries,
                    max_retries = MAX_RETRIES,
                    error = %e,
                    "Database connection failed, retrying..."
                );
                tokio::time::sleep(RETRY_DELAY).await;
            },
            Err(e) => {
                return Err(e).context("Failed to create database connection pool after retries");
            },
        }
    }
}

/// Creates the directory holding the database file if it does not exist.
fn ensure_parent_dir(options: &SqliteConnectOptions) -> Result<()> {
    let filename = options.get_filename();
    if filename == Path::new(":memory:") {
        return Ok(());
    }

    if let Some(parent) = filename.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create database directory {}", parent.display()))?;
    }

    Ok(())
}
