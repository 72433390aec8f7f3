//! Application state for the compliance API

use std::sync::Arc;

use anyhow::Result;
use compliance_engine::{ComplianceEngine, EngineConfig};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::audit_store::SqliteAuditLog;

pub struct AppState {
    pub engine: ComplianceEngine,
    pub db: SqlitePool,
}

impl AppState {
    /// Connect the database and build an engine that audits into it
    pub async fn new(database_url: &str, config: &EngineConfig) -> Result<Self> {
        tracing::info!("Connecting to database: {}", database_url);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        Self::run_migrations(&pool).await?;

        let audit = SqliteAuditLog::open(pool.clone()).await?;
        let engine = ComplianceEngine::from_config(config)
            .await?
            .with_audit_sink(Arc::new(audit));

        Ok(Self { engine, db: pool })
    }

    pub(crate) async fn run_migrations(pool: &SqlitePool) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS audit_log (
                sequence INTEGER PRIMARY KEY,
                record_id TEXT NOT NULL UNIQUE,
                feature_id TEXT NOT NULL,
                recorded_at TEXT NOT NULL,
                previous_hash TEXT,
                record_hash TEXT NOT NULL,
                record_json TEXT NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_audit_log_feature ON audit_log(feature_id)
            "#,
        )
        .execute(pool)
        .await?;

        tracing::info!("Migrations complete");
        Ok(())
    }
}
