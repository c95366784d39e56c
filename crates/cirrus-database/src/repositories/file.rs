use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use cirrus_core::types::{NodeListOptions, PageRequest, PageResponse};
use cirrus_core::{AppError, AppResult, ErrorKind};
use cirrus_entity::{File, NewFile};

use super::filter::ListingFilter;

/// Data access for the `files` table.
#[derive(Debug, Clone)]
pub struct FileRepository {
    pool: SqlitePool,
}

impl FileRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, data: &NewFile) -> AppResult<File> {
        let now = Utc::now();

        sqlx::query_as::<_, File>(
            "INSERT INTO files (uuid, name, owner_id, parent_id, size, mime_type,
                                storage_key, storage_provider, is_starred, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, 0, ?, ?)
             RETURNING *",
        )
        .bind(data.uuid)
        .bind(&data.name)
        .bind(data.owner_id)
        .bind(data.parent_id)
        .bind(data.size)
        .bind(&data.mime_type)
        .bind(&data.storage_key)
        .bind(&data.storage_provider)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create file", e))
    }

    pub async fn find_by_id(&self, id: i64, owner_id: i64) -> AppResult<Option<File>> {
        sqlx::query_as::<_, File>("SELECT * FROM files WHERE id = ? AND owner_id = ?")
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to fetch file", e))
    }

    pub async fn find_by_uuid(&self, uuid: Uuid, owner_id: i64) -> AppResult<Option<File>> {
        sqlx::query_as::<_, File>("SELECT * FROM files WHERE uuid = ? AND owner_id = ?")
            .bind(uuid)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to fetch file", e))
    }

    /// Finder without the owner scope, for resolving share targets.
    pub async fn find_by_id_unscoped(&self, id: i64) -> AppResult<Option<File>> {
        sqlx::query_as::<_, File>("SELECT * FROM files WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to fetch file", e))
    }

    pub async fn list(
        &self,
        owner_id: i64,
        parent_id: Option<i64>,
        options: &NodeListOptions,
        page: &PageRequest,
    ) -> AppResult<PageResponse<File>> {
        let filter = ListingFilter::new(parent_id, options);

        let count_sql = format!("SELECT COUNT(*) FROM files {}", filter.clause);
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql).bind(owner_id);
        if let Some(pattern) = &filter.pattern {
            count_query = count_query.bind(pattern.clone());
        }
        if let Some(parent) = filter.parent_bind {
            count_query = count_query.bind(parent);
        }
        let total = count_query
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count files", e))?;

        let page_sql = format!(
            "SELECT * FROM files {} ORDER BY {} {} LIMIT ? OFFSET ?",
            filter.clause,
            options.sort.file_column(),
            options.order.as_sql(),
        );
        let mut page_query = sqlx::query_as::<_, File>(&page_sql).bind(owner_id);
        if let Some(pattern) = &filter.pattern {
            page_query = page_query.bind(pattern.clone());
        }
        if let Some(parent) = filter.parent_bind {
            page_query = page_query.bind(parent);
        }
        let items = page_query
            .bind(page.limit() as i64)
            .bind(page.offset() as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list files", e))?;

        Ok(PageResponse::new(items, page, total as u64))
    }

    pub async fn rename(&self, id: i64, name: &str) -> AppResult<Option<File>> {
        sqlx::query_as::<_, File>(
            "UPDATE files SET name = ?, updated_at = ? WHERE id = ? RETURNING *",
        )
        .bind(name)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to rename file", e))
    }

    pub async fn set_parent(&self, id: i64, parent_id: Option<i64>) -> AppResult<Option<File>> {
        sqlx::query_as::<_, File>(
            "UPDATE files SET parent_id = ?, updated_at = ? WHERE id = ? RETURNING *",
        )
        .bind(parent_id)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to move file", e))
    }

    pub async fn set_starred(&self, id: i64, starred: bool) -> AppResult<Option<File>> {
        sqlx::query_as::<_, File>(
            "UPDATE files SET is_starred = ?, updated_at = ? WHERE id = ? RETURNING *",
        )
        .bind(starred)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to star file", e))
    }

    /// Sets or clears the soft-delete timestamp.
    pub async fn set_deleted_at(
        &self,
        id: i64,
        deleted_at: Option<DateTime<Utc>>,
    ) -> AppResult<Option<File>> {
        sqlx::query_as::<_, File>(
            "UPDATE files SET deleted_at = ?, updated_at = ? WHERE id = ? RETURNING *",
        )
        .bind(deleted_at)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update file state", e))
    }

    pub async fn find_trashed(&self, owner_id: i64) -> AppResult<Vec<File>> {
        sqlx::query_as::<_, File>(
            "SELECT * FROM files WHERE owner_id = ? AND deleted_at IS NOT NULL",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list trashed files", e))
    }

    /// All files directly inside any of the given folders, for cascade
    /// purges. Includes trashed rows.
    pub async fn find_by_parent_ids(
        &self,
        owner_id: i64,
        parent_ids: &[i64],
    ) -> AppResult<Vec<File>> {
        if parent_ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; parent_ids.len()].join(", ");
        let sql =
            format!("SELECT * FROM files WHERE owner_id = ? AND parent_id IN ({placeholders})");

        let mut query = sqlx::query_as::<_, File>(&sql).bind(owner_id);
        for id in parent_ids {
            query = query.bind(id);
        }

        query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to fetch folder files", e))
    }

    pub async fn delete(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM files WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete file", e))?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_by_ids(&self, ids: &[i64]) -> AppResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!("DELETE FROM files WHERE id IN ({placeholders})");

        let mut query = sqlx::query(&sql);
        for id in ids {
            query = query.bind(id);
        }

        let result = query
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete files", e))?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::DatabasePool;
    use crate::repositories::user::UserRepository;
    use cirrus_core::types::NodeSortKey;
    use cirrus_core::types::SortDirection;
    use cirrus_entity::NewUser;

    async fn setup() -> (DatabasePool, i64) {
        let db = DatabasePool::open_in_memory().await.unwrap();
        let users = UserRepository::new(db.pool().clone());
        let owner = users
            .create(&NewUser {
                uuid: Uuid::new_v4(),
                email: "owner@example.com".to_string(),
                display_name: "Owner".to_string(),
            })
            .await
            .unwrap();
        (db, owner.id)
    }

    fn new_file(owner_id: i64, name: &str, size: i64) -> NewFile {
        NewFile {
            uuid: Uuid::new_v4(),
            name: name.to_string(),
            owner_id,
            parent_id: None,
            size,
            mime_type: Some("text/plain".to_string()),
            storage_key: format!("{owner_id}/{}/{name}", Uuid::new_v4()),
            storage_provider: "local".to_string(),
        }
    }

    #[tokio::test]
    async fn create_preserves_storage_metadata() {
        let (db, owner) = setup().await;
        let repo = FileRepository::new(db.pool().clone());

        let data = new_file(owner, "report.txt", 512);
        let created = repo.create(&data).await.unwrap();

        assert_eq!(created.size, 512);
        assert_eq!(created.storage_key, data.storage_key);
        assert_eq!(created.storage_provider, "local");
        assert_eq!(created.mime_type.as_deref(), Some("text/plain"));
    }

    #[tokio::test]
    async fn size_sorting_orders_numerically() {
        let (db, owner) = setup().await;
        let repo = FileRepository::new(db.pool().clone());

        repo.create(&new_file(owner, "big.bin", 9000)).await.unwrap();
        repo.create(&new_file(owner, "small.bin", 10)).await.unwrap();
        repo.create(&new_file(owner, "mid.bin", 400)).await.unwrap();

        let options = NodeListOptions {
            sort: NodeSortKey::Size,
            order: SortDirection::Desc,
            ..NodeListOptions::default()
        };
        let listed = repo
            .list(owner, None, &options, &PageRequest::default())
            .await
            .unwrap();

        let sizes: Vec<i64> = listed.items.iter().map(|f| f.size).collect();
        assert_eq!(sizes, vec![9000, 400, 10]);
    }

    #[tokio::test]
    async fn pagination_reports_totals_across_pages() {
        let (db, owner) = setup().await;
        let repo = FileRepository::new(db.pool().clone());

        for i in 0..7 {
            repo.create(&new_file(owner, &format!("f{i}.txt"), i)).await.unwrap();
        }

        let page = PageRequest::new(2, 3);
        let listed = repo
            .list(owner, None, &NodeListOptions::default(), &page)
            .await
            .unwrap();

        assert_eq!(listed.items.len(), 3);
        assert_eq!(listed.total_items, 7);
        assert_eq!(listed.total_pages, 3);
        assert!(listed.has_next);
        assert!(listed.has_previous);
    }

    #[tokio::test]
    async fn delete_reports_whether_a_row_was_removed() {
        let (db, owner) = setup().await;
        let repo = FileRepository::new(db.pool().clone());

        let file = repo.create(&new_file(owner, "gone.txt", 1)).await.unwrap();
        assert!(repo.delete(file.id).await.unwrap());
        assert!(!repo.delete(file.id).await.unwrap());
    }
}
