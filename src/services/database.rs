//! Database service for vetms-api.

use crate::config::VetmsConfig;
use crate::error::AppError;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::time::Duration;
use tracing::{info, instrument};

const SCHEMA_SQL: &str = include_str!("../../schema.sql");

/// Connection pool wrapper over the embedded SQLite database.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
    invoice_prefix: String,
}

impl Database {
    /// Open (creating if necessary) the database file under the configured
    /// data directory.
    #[instrument(skip(config), fields(service = "vetms-api"))]
    pub async fn new(config: &VetmsConfig) -> Result<Self, AppError> {
        let path = config.database_path();
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        info!(
            path = %path.display(),
            max_connections = config.max_connections,
            "Opening SQLite database"
        );

        let options = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        Self::connect(options, config.max_connections, &config.invoice_prefix).await
    }

    /// Connect with explicit options. Integration tests use this with an
    /// in-memory database.
    pub async fn connect(
        options: SqliteConnectOptions,
        max_connections: u32,
        invoice_prefix: &str,
    ) -> Result<Self, AppError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(30))
            .connect_with(options)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        Ok(Self {
            pool,
            invoice_prefix: invoice_prefix.to_string(),
        })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub(crate) fn invoice_prefix(&self) -> &str {
        &self.invoice_prefix
    }

    /// Check database health.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }

    /// Ensure every core table exists and apply additive migrations. Safe
    /// to invoke on every process start.
    #[instrument(skip(self))]
    pub async fn ensure_schema(&self) -> Result<(), AppError> {
        info!("Ensuring database schema");

        sqlx::raw_sql(SCHEMA_SQL)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to apply schema: {}", e))
            })?;

        // Legacy installations predate the pet_id column on invoice_items;
        // add it only when absent so re-runs never fail.
        let has_pet_id: Option<i64> = sqlx::query_scalar(
            "SELECT 1 FROM pragma_table_info('invoice_items') WHERE name = 'pet_id'",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to inspect invoice_items: {}", e))
        })?;

        if has_pet_id.is_none() {
            info!("Applying migration: invoice_items.pet_id");
            sqlx::query("ALTER TABLE invoice_items ADD COLUMN pet_id INTEGER")
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!(
                        "Failed to add invoice_items.pet_id: {}",
                        e
                    ))
                })?;
        }

        info!("Database schema ready");
        Ok(())
    }
}
