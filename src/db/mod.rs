//! Database layer
//!
//! SQLite storage for news, comments, users and sessions.
//!
//! # Usage
//!
//! ```ignore
//! use yanews::config::DatabaseConfig;
//! use yanews::db::{create_pool, migrations};
//!
//! let pool = create_pool(&DatabaseConfig::default()).await?;
//! migrations::run_migrations(&pool).await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{create_pool, create_test_pool, ping, DbPool};
