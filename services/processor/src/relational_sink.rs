use crate::config::DatabaseConfig;
use crate::error::ProcessorError;
use crate::record::ProcessedRecord;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Idempotent insert: a replay of the same record id is a no-op
pub const INSERT_RECORD_SQL: &str = r#"
    INSERT INTO processed_records (id, user_email, value, processed_at)
    VALUES ($1, $2, $3, $4)
    ON CONFLICT (id) DO NOTHING
"#;

/// Relational store for processed records
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RelationalSink: Send + Sync {
    /// Insert the record unless its id exists. Returns whether a row was written.
    async fn upsert(&self, record: &ProcessedRecord) -> Result<bool, ProcessorError>;

    /// Cheap connectivity probe for readiness checks
    async fn ping(&self) -> Result<(), ProcessorError>;
}

/// PostgreSQL-backed record store
pub struct PostgresRecordStore {
    pool: PgPool,
}

impl PostgresRecordStore {
    /// Create a pool. Connections are opened on first use so an unreachable
    /// database fails individual writes rather than startup.
    pub fn new(config: &DatabaseConfig) -> Self {
        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .database(&config.name)
            .username(&config.user)
            .password(&config.password);

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .connect_lazy_with(options);

        info!(
            host = %config.host,
            database = %config.name,
            "PostgreSQL pool configured"
        );

        Self { pool }
    }

    /// Run database migrations
    pub async fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations");

        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run migrations")?;

        info!("Database migrations completed");
        Ok(())
    }
}

#[async_trait]
impl RelationalSink for PostgresRecordStore {
    #[instrument(skip(self, record), fields(record_id = %record.record_id))]
    async fn upsert(&self, record: &ProcessedRecord) -> Result<bool, ProcessorError> {
        let result = sqlx::query(INSERT_RECORD_SQL)
            .bind(&record.record_id)
            .bind(&record.user_email)
            .bind(record.value_f64())
            .bind(&record.processed_at)
            .execute(&self.pool)
            .await
            .map_err(|e| ProcessorError::sink("relational", e.to_string()))?;

        let inserted = result.rows_affected() > 0;
        debug!(inserted, "Relational upsert executed");

        Ok(inserted)
    }

    async fn ping(&self) -> Result<(), ProcessorError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(|e| ProcessorError::sink("relational", e.to_string()))
    }
}
