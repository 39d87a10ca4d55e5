//! Database connection pool
//!
//! Accepts a plain file path, a `sqlite:` URL or `:memory:`. File databases
//! get their parent directory created on first use.

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

use crate::config::DatabaseConfig;

/// Shared pool type used by the repositories
pub type DbPool = SqlitePool;

fn is_memory_url(url: &str) -> bool {
    url == ":memory:" || url.starts_with("sqlite::memory:")
}

/// Normalize a configured database location into a `sqlite:` URL
fn connection_url(url: &str) -> String {
    if url == ":memory:" {
        "sqlite::memory:".to_string()
    } else if url.starts_with("sqlite:") {
        url.to_string()
    } else {
        format!("sqlite:{}", url)
    }
}

fn ensure_parent_dir(url: &str) -> Result<()> {
    let path = url.trim_start_matches("sqlite:");
    let path = path.split('?').next().unwrap_or(path);
    if let Some(parent) = std::path::Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create database directory: {:?}", parent))?;
        }
    }
    Ok(())
}

/// Create a connection pool from configuration.
pub async fn create_pool(config: &DatabaseConfig) -> Result<DbPool> {
    let memory = is_memory_url(&config.url);
    if !memory {
        ensure_parent_dir(&config.url)?;
    }

    let options = SqliteConnectOptions::from_str(&connection_url(&config.url))
        .with_context(|| format!("Invalid SQLite URL: {}", config.url))?
        .create_if_missing(true)
        .foreign_keys(true);

    // Every connection to `:memory:` opens a separate database, so an
    // in-memory pool is pinned to one connection that never gets recycled.
    let pool_options = if memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(20)
    };

    let pool = pool_options
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to connect to SQLite database: {}", config.url))?;

    Ok(pool)
}

/// Create an in-memory pool for tests
pub async fn create_test_pool() -> Result<DbPool> {
    let config = DatabaseConfig {
        url: ":memory:".to_string(),
    };
    create_pool(&config).await
}

/// Check that the database answers
pub async fn ping(pool: &DbPool) -> Result<()> {
    sqlx::query("SELECT 1")
        .fetch_one(pool)
        .await
        .context("Database ping failed")?;
    Ok(())
}
