use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

use cirrus_core::traits::{AuditEvent, AuditSink};
use cirrus_core::types::{PageRequest, PageResponse};
use cirrus_core::{AppError, AppResult, ErrorKind};
use cirrus_entity::AuditEntry;

/// Data access for the append-only `audit_log` table.
#[derive(Debug, Clone)]
pub struct AuditLogRepository {
    pool: SqlitePool,
}

impl AuditLogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn append(&self, event: &AuditEvent) -> AppResult<AuditEntry> {
        sqlx::query_as::<_, AuditEntry>(
            "INSERT INTO audit_log (actor_id, action, target_type, target_id, details, created_at)
             VALUES (?, ?, ?, ?, ?, ?)
             RETURNING *",
        )
        .bind(event.actor_id)
        .bind(&event.action)
        .bind(&event.target_type)
        .bind(event.target_id)
        .bind(event.details.clone())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to append audit entry", e))
    }

    /// Newest entries first.
    pub async fn recent(&self, page: &PageRequest) -> AppResult<PageResponse<AuditEntry>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM audit_log")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count audit entries", e))?;

        let items = sqlx::query_as::<_, AuditEntry>(
            "SELECT * FROM audit_log ORDER BY id DESC LIMIT ? OFFSET ?",
        )
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list audit entries", e))?;

        Ok(PageResponse::new(items, page, total as u64))
    }
}

/// [`AuditSink`] backed by the audit_log table.
#[derive(Debug, Clone)]
pub struct SqlAuditSink {
    repo: AuditLogRepository,
}

impl SqlAuditSink {
    pub fn new(repo: AuditLogRepository) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl AuditSink for SqlAuditSink {
    async fn record(&self, event: &AuditEvent) -> AppResult<()> {
        self.repo.append(event).await?;
        Ok(())
    }
}
