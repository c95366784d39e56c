use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use cirrus_core::types::{PageRequest, PageResponse};
use cirrus_core::{AppError, AppResult, ErrorKind};
use cirrus_entity::{NewShare, Share, SharePermission, ShareResource};

/// Data access for the `shares` table.
///
/// Rows are never deleted here; revocation and expiry clear `is_active`.
#[derive(Debug, Clone)]
pub struct ShareRepository {
    pool: SqlitePool,
}

impl ShareRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Inserts a grant. A token collision surfaces as `Conflict` so the
    /// caller can retry with a fresh token.
    pub async fn create(&self, data: &NewShare) -> AppResult<Share> {
        let now = Utc::now();

        sqlx::query_as::<_, Share>(
            "INSERT INTO shares (uuid, token, file_id, folder_id, created_by, recipient_id,
                                 permission, is_active, expires_at, password_hash,
                                 download_enabled, views, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, 1, ?, ?, ?, 0, ?, ?)
             RETURNING *",
        )
        .bind(data.uuid)
        .bind(&data.token)
        .bind(data.resource.file_id())
        .bind(data.resource.folder_id())
        .bind(data.created_by)
        .bind(data.recipient_id)
        .bind(data.permission)
        .bind(data.expires_at)
        .bind(&data.password_hash)
        .bind(data.download_enabled)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::conflict("Share token already in use");
                }
            }
            AppError::with_source(ErrorKind::Database, "Failed to create share", e)
        })
    }

    /// Active grant for a token, if any. Expiry is the service's concern.
    pub async fn find_by_token(&self, token: &str) -> AppResult<Option<Share>> {
        sqlx::query_as::<_, Share>("SELECT * FROM shares WHERE token = ? AND is_active = 1")
            .bind(token)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to fetch share", e))
    }

    /// The active grant matching the (resource, creator, recipient) triple.
    /// `IS ?` keeps the comparison null-safe for public links.
    pub async fn find_active_grant(
        &self,
        created_by: i64,
        resource: ShareResource,
        recipient_id: Option<i64>,
    ) -> AppResult<Option<Share>> {
        sqlx::query_as::<_, Share>(
            "SELECT * FROM shares
             WHERE created_by = ? AND is_active = 1
               AND file_id IS ? AND folder_id IS ? AND recipient_id IS ?",
        )
        .bind(created_by)
        .bind(resource.file_id())
        .bind(resource.folder_id())
        .bind(recipient_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to fetch share grant", e))
    }

    /// Rewrites the mutable grant fields, leaving token and views alone.
    pub async fn update_grant(
        &self,
        id: i64,
        permission: SharePermission,
        expires_at: Option<DateTime<Utc>>,
        password_hash: Option<&str>,
        download_enabled: bool,
    ) -> AppResult<Share> {
        sqlx::query_as::<_, Share>(
            "UPDATE shares
             SET permission = ?, expires_at = ?, password_hash = ?, download_enabled = ?,
                 updated_at = ?
             WHERE id = ?
             RETURNING *",
        )
        .bind(permission)
        .bind(expires_at)
        .bind(password_hash)
        .bind(download_enabled)
        .bind(Utc::now())
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update share", e))
    }

    pub async fn increment_views(&self, id: i64) -> AppResult<()> {
        sqlx::query("UPDATE shares SET views = views + 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count share view", e))?;

        Ok(())
    }

    pub async fn deactivate(&self, id: i64) -> AppResult<()> {
        sqlx::query("UPDATE shares SET is_active = 0, updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to deactivate share", e))?;

        Ok(())
    }

    /// Deactivates every active grant the creator holds on the resource.
    /// Returns how many were revoked.
    pub async fn deactivate_for_resource(
        &self,
        created_by: i64,
        resource: ShareResource,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE shares SET is_active = 0, updated_at = ?
             WHERE created_by = ? AND is_active = 1 AND file_id IS ? AND folder_id IS ?",
        )
        .bind(Utc::now())
        .bind(created_by)
        .bind(resource.file_id())
        .bind(resource.folder_id())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to revoke shares", e))?;

        Ok(result.rows_affected())
    }

    /// Purge-side revocation: kills every grant pointing at the given
    /// files, whoever created it.
    pub async fn deactivate_for_files(&self, file_ids: &[i64]) -> AppResult<u64> {
        self.deactivate_for_column("file_id", file_ids).await
    }

    /// Purge-side revocation for folders.
    pub async fn deactivate_for_folders(&self, folder_ids: &[i64]) -> AppResult<u64> {
        self.deactivate_for_column("folder_id", folder_ids).await
    }

    async fn deactivate_for_column(&self, column: &str, ids: &[i64]) -> AppResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "UPDATE shares SET is_active = 0, updated_at = ?
             WHERE is_active = 1 AND {column} IN ({placeholders})"
        );

        let mut query = sqlx::query(&sql).bind(Utc::now());
        for id in ids {
            query = query.bind(id);
        }

        let result = query
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to revoke shares", e))?;

        Ok(result.rows_affected())
    }

    /// Every grant the creator holds on the resource, newest first,
    /// including revoked ones.
    pub async fn find_by_resource(
        &self,
        created_by: i64,
        resource: ShareResource,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Share>> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM shares
             WHERE created_by = ? AND file_id IS ? AND folder_id IS ?",
        )
        .bind(created_by)
        .bind(resource.file_id())
        .bind(resource.folder_id())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count shares", e))?;

        let items = sqlx::query_as::<_, Share>(
            "SELECT * FROM shares
             WHERE created_by = ? AND file_id IS ? AND folder_id IS ?
             ORDER BY created_at DESC
             LIMIT ? OFFSET ?",
        )
        .bind(created_by)
        .bind(resource.file_id())
        .bind(resource.folder_id())
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list shares", e))?;

        Ok(PageResponse::new(items, page, total as u64))
    }

    /// Active grants addressed to the recipient, newest first.
    pub async fn find_shared_with(
        &self,
        recipient_id: i64,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Share>> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM shares WHERE recipient_id = ? AND is_active = 1",
        )
        .bind(recipient_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count shares", e))?;

        let items = sqlx::query_as::<_, Share>(
            "SELECT * FROM shares
             WHERE recipient_id = ? AND is_active = 1
             ORDER BY created_at DESC
             LIMIT ? OFFSET ?",
        )
        .bind(recipient_id)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list shares", e))?;

        Ok(PageResponse::new(items, page, total as u64))
    }
}
