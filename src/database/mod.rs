// ABOUTME: SQLite database manager for users, food journal, product cache and admin queues
// ABOUTME: Owns the connection pool, runs schema migrations and shares row conversion helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Database Management
//!
//! One [`Database`] wraps the `SQLite` pool. Table-specific operations live in
//! the submodules as additional `impl Database` blocks.

mod articles;
mod daily_analyses;
mod favorites;
mod foods;
mod product_requests;
mod products;
mod users;

pub use users::ProfileUpdate;

use crate::errors::{AppError, AppResult};
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;
use tracing::info;
use uuid::Uuid;

/// Database manager for all persistent state
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Create a new database connection and run migrations
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid, the connection fails or a
    /// migration fails
    pub async fn new(database_url: &str) -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| AppError::config(format!("Invalid database URL: {e}")))?
            .create_if_missing(true)
            .foreign_keys(true);

        // Every connection to :memory: opens a separate database
        let max_connections = if database_url.contains(":memory:") {
            1
        } else {
            5
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|e| AppError::database(format!("Failed to connect to database: {e}")))?;

        let db = Self { pool };
        db.migrate().await?;
        info!("Database ready ({max_connections} connection(s))");
        Ok(db)
    }

    /// Get a reference to the database pool for advanced operations
    #[must_use]
    pub const fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Run database migrations
    ///
    /// # Errors
    ///
    /// Returns an error if any table or index creation fails
    pub async fn migrate(&self) -> AppResult<()> {
        self.migrate_users().await?;
        self.migrate_foods().await?;
        self.migrate_products().await?;
        self.migrate_product_requests().await?;
        self.migrate_favorites().await?;
        self.migrate_daily_analyses().await?;
        self.migrate_articles().await?;
        Ok(())
    }
}

/// Format a timestamp so that lexical order in `SQLite` matches time order
pub(crate) fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a timestamp written by [`format_timestamp`]
pub(crate) fn parse_timestamp(raw: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::database(format!("Invalid timestamp '{raw}': {e}")))
}

/// Parse an optional timestamp column
pub(crate) fn parse_optional_timestamp(raw: Option<String>) -> AppResult<Option<DateTime<Utc>>> {
    raw.as_deref().map(parse_timestamp).transpose()
}

/// Parse a UUID column
pub(crate) fn parse_uuid(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|e| AppError::database(format!("Invalid UUID '{raw}': {e}")))
}
