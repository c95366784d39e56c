//! Connection pool management.

use std::str::FromStr;
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use tracing::info;

use cirrus_core::config::DatabaseConfig;
use cirrus_core::{AppError, AppResult, ErrorKind};

use crate::schema;

/// Owned handle to the SQLite pool. Cloning is cheap and shares the pool.
#[derive(Debug, Clone)]
pub struct DatabasePool {
    pool: SqlitePool,
}

impl DatabasePool {
    /// Opens the database named by the config, creating the file if
    /// missing, and applies the embedded schema.
    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str(&config.url)
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Configuration,
                    format!("Invalid database URL: {}", config.url),
                    e,
                )
            })?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
            .connect_with(options)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to open database", e))?;

        schema::apply(&pool).await?;

        info!(
            url = %config.url,
            max_connections = config.max_connections,
            "Database ready"
        );

        Ok(Self { pool })
    }

    /// Opens a private in-memory database with the schema applied.
    ///
    /// The pool is pinned to a single connection that is never reaped;
    /// SQLite drops an in-memory database when its last connection closes.
    pub async fn open_in_memory() -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| {
                AppError::with_source(ErrorKind::Configuration, "Invalid in-memory URL", e)
            })?
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to open in-memory database", e)
            })?;

        schema::apply(&pool).await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Cheap liveness probe.
    pub async fn health_check(&self) -> AppResult<bool> {
        let value: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Health check query failed", e)
            })?;

        Ok(value == 1)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_database_answers_health_checks() {
        let db = DatabasePool::open_in_memory().await.unwrap();
        assert!(db.health_check().await.unwrap());
        db.close().await;
    }
}
