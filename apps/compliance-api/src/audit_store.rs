//! SQLite-backed audit sink
//!
//! Each row keeps the sealed record as JSON next to the columns used for
//! lookups, so verification always hashes exactly what was sealed.

use async_trait::async_trait;
use compliance_engine::{AuditError, AuditSink};
use shared_types::{AuditRecord, ComplianceVerdict};
use sqlx::sqlite::SqlitePool;
use tokio::sync::Mutex;

pub struct SqliteAuditLog {
    pool: SqlitePool,
    last: Mutex<Option<AuditRecord>>,
}

impl SqliteAuditLog {
    /// Attach to a migrated pool, continuing the chain of any stored records
    pub async fn open(pool: SqlitePool) -> Result<Self, AuditError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT record_json FROM audit_log ORDER BY sequence DESC LIMIT 1")
                .fetch_optional(&pool)
                .await
                .map_err(database)?;

        let last = row
            .map(|(json,)| AuditRecord::from_json_line(&json))
            .transpose()?;

        tracing::info!(
            next_sequence = last.as_ref().map(|r| r.sequence + 1).unwrap_or(0),
            "SQLite audit log ready"
        );

        Ok(Self {
            pool,
            last: Mutex::new(last),
        })
    }
}

fn database(e: sqlx::Error) -> AuditError {
    AuditError::Database(e.to_string())
}

#[async_trait]
impl AuditSink for SqliteAuditLog {
    async fn append(&self, verdict: &ComplianceVerdict) -> Result<AuditRecord, AuditError> {
        let mut last = self.last.lock().await;
        let record = AuditRecord::seal(verdict.clone(), last.as_ref());
        let json = record.to_json_line()?;

        sqlx::query(
            r#"
            INSERT INTO audit_log (sequence, record_id, feature_id, recorded_at, previous_hash, record_hash, record_json)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.sequence as i64)
        .bind(&record.record_id)
        .bind(&record.verdict.feature_id)
        .bind(record.recorded_at.to_rfc3339())
        .bind(&record.previous_hash)
        .bind(&record.record_hash)
        .bind(&json)
        .execute(&self.pool)
        .await
        .map_err(database)?;

        tracing::debug!(sequence = record.sequence, "Audit record stored");
        *last = Some(record.clone());
        Ok(record)
    }

    async fn records(&self) -> Result<Vec<AuditRecord>, AuditError> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT record_json FROM audit_log ORDER BY sequence ASC")
                .fetch_all(&self.pool)
                .await
                .map_err(database)?;

        rows.iter()
            .map(|(json,)| AuditRecord::from_json_line(json).map_err(AuditError::from))
            .collect()
    }
}
