use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use cirrus_core::types::{NodeListOptions, PageRequest, PageResponse};
use cirrus_core::{AppError, AppResult, ErrorKind};
use cirrus_entity::{Folder, NewFolder};

use super::filter::ListingFilter;

/// Data access for the `folders` table.
///
/// Finders are owner-scoped unless the name says otherwise; a row that
/// belongs to someone else is reported as absent.
#[derive(Debug, Clone)]
pub struct FolderRepository {
    pool: SqlitePool,
}

impl FolderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, data: &NewFolder) -> AppResult<Folder> {
        let now = Utc::now();

        sqlx::query_as::<_, Folder>(
            "INSERT INTO folders (uuid, name, owner_id, parent_id, is_starred, created_at, updated_at)
             VALUES (?, ?, ?, ?, 0, ?, ?)
             RETURNING *",
        )
        .bind(data.uuid)
        .bind(&data.name)
        .bind(data.owner_id)
        .bind(data.parent_id)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create folder", e))
    }

    pub async fn find_by_id(&self, id: i64, owner_id: i64) -> AppResult<Option<Folder>> {
        sqlx::query_as::<_, Folder>("SELECT * FROM folders WHERE id = ? AND owner_id = ?")
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to fetch folder", e))
    }

    pub async fn find_by_uuid(&self, uuid: Uuid, owner_id: i64) -> AppResult<Option<Folder>> {
        sqlx::query_as::<_, Folder>("SELECT * FROM folders WHERE uuid = ? AND owner_id = ?")
            .bind(uuid)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to fetch folder", e))
    }

    /// Finder without the owner scope, for resolving share targets.
    pub async fn find_by_id_unscoped(&self, id: i64) -> AppResult<Option<Folder>> {
        sqlx::query_as::<_, Folder>("SELECT * FROM folders WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to fetch folder", e))
    }

    pub async fn list(
        &self,
        owner_id: i64,
        parent_id: Option<i64>,
        options: &NodeListOptions,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Folder>> {
        let filter = ListingFilter::new(parent_id, options);

        let count_sql = format!("SELECT COUNT(*) FROM folders {}", filter.clause);
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
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count folders", e))?;

        let page_sql = format!(
            "SELECT * FROM folders {} ORDER BY {} {} LIMIT ? OFFSET ?",
            filter.clause,
            options.sort.folder_column(),
            options.order.as_sql(),
        );
        let mut page_query = sqlx::query_as::<_, Folder>(&page_sql).bind(owner_id);
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
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list folders", e))?;

        Ok(PageResponse::new(items, page, total as u64))
    }

    pub async fn rename(&self, id: i64, name: &str) -> AppResult<Option<Folder>> {
        sqlx::query_as::<_, Folder>(
            "UPDATE folders SET name = ?, updated_at = ? WHERE id = ? RETURNING *",
        )
        .bind(name)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to rename folder", e))
    }

    pub async fn set_parent(&self, id: i64, parent_id: Option<i64>) -> AppResult<Option<Folder>> {
        sqlx::query_as::<_, Folder>(
            "UPDATE folders SET parent_id = ?, updated_at = ? WHERE id = ? RETURNING *",
        )
        .bind(parent_id)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to move folder", e))
    }

    pub async fn set_starred(&self, id: i64, starred: bool) -> AppResult<Option<Folder>> {
        sqlx::query_as::<_, Folder>(
            "UPDATE folders SET is_starred = ?, updated_at = ? WHERE id = ? RETURNING *",
        )
        .bind(starred)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to star folder", e))
    }

    /// Sets or clears the soft-delete timestamp.
    pub async fn set_deleted_at(
        &self,
        id: i64,
        deleted_at: Option<DateTime<Utc>>,
    ) -> AppResult<Option<Folder>> {
        sqlx::query_as::<_, Folder>(
            "UPDATE folders SET deleted_at = ?, updated_at = ? WHERE id = ? RETURNING *",
        )
        .bind(deleted_at)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update folder state", e))
    }

    pub async fn find_trashed(&self, owner_id: i64) -> AppResult<Vec<Folder>> {
        sqlx::query_as::<_, Folder>(
            "SELECT * FROM folders WHERE owner_id = ? AND deleted_at IS NOT NULL",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list trashed folders", e))
    }

    /// Ids of folders whose parent is any of `parent_ids`. One BFS frontier
    /// step in descendant walks.
    pub async fn child_folder_ids(
        &self,
        owner_id: i64,
        parent_ids: &[i64],
    ) -> AppResult<Vec<i64>> {
        if parent_ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; parent_ids.len()].join(", ");
        let sql = format!(
            "SELECT id FROM folders WHERE owner_id = ? AND parent_id IN ({placeholders})"
        );

        let mut query = sqlx::query_scalar::<_, i64>(&sql).bind(owner_id);
        for id in parent_ids {
            query = query.bind(id);
        }

        query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to fetch child folders", e))
    }

    pub async fn delete_by_ids(&self, ids: &[i64]) -> AppResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!("DELETE FROM folders WHERE id IN ({placeholders})");

        let mut query = sqlx::query(&sql);
        for id in ids {
            query = query.bind(id);
        }

        let result = query
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete folders", e))?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::DatabasePool;
    use crate::repositories::user::UserRepository;
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

    fn new_folder(owner_id: i64, name: &str, parent_id: Option<i64>) -> NewFolder {
        NewFolder {
            uuid: Uuid::new_v4(),
            name: name.to_string(),
            owner_id,
            parent_id,
        }
    }

    #[tokio::test]
    async fn create_and_fetch_round_trip() {
        let (db, owner) = setup().await;
        let repo = FolderRepository::new(db.pool().clone());

        let created = repo.create(&new_folder(owner, "Documents", None)).await.unwrap();
        assert_eq!(created.name, "Documents");
        assert!(created.parent_id.is_none());
        assert!(!created.is_trashed());

        let by_uuid = repo.find_by_uuid(created.uuid, owner).await.unwrap().unwrap();
        assert_eq!(by_uuid.id, created.id);

        // Wrong owner sees nothing.
        assert!(repo.find_by_id(created.id, owner + 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn listing_separates_live_and_trashed() {
        let (db, owner) = setup().await;
        let repo = FolderRepository::new(db.pool().clone());

        let keep = repo.create(&new_folder(owner, "Keep", None)).await.unwrap();
        let toss = repo.create(&new_folder(owner, "Toss", None)).await.unwrap();
        repo.set_deleted_at(toss.id, Some(Utc::now())).await.unwrap();

        let page = PageRequest::default();
        let live = repo
            .list(owner, None, &NodeListOptions::default(), &page)
            .await
            .unwrap();
        assert_eq!(live.items.len(), 1);
        assert_eq!(live.items[0].id, keep.id);

        let trashed = repo
            .list(owner, None, &NodeListOptions::trashed_only(), &page)
            .await
            .unwrap();
        assert_eq!(trashed.items.len(), 1);
        assert_eq!(trashed.items[0].id, toss.id);
    }

    #[tokio::test]
    async fn search_is_case_insensitive_and_tree_wide() {
        let (db, owner) = setup().await;
        let repo = FolderRepository::new(db.pool().clone());

        let root = repo.create(&new_folder(owner, "Finance", None)).await.unwrap();
        repo.create(&new_folder(owner, "Tax Returns", Some(root.id)))
            .await
            .unwrap();

        let options = NodeListOptions {
            search: Some("TAX".to_string()),
            ..NodeListOptions::default()
        };
        // Listing at the root still finds the nested match.
        let found = repo
            .list(owner, None, &options, &PageRequest::default())
            .await
            .unwrap();
        assert_eq!(found.items.len(), 1);
        assert_eq!(found.items[0].name, "Tax Returns");
    }

    #[tokio::test]
    async fn starred_filter_narrows_results() {
        let (db, owner) = setup().await;
        let repo = FolderRepository::new(db.pool().clone());

        let plain = repo.create(&new_folder(owner, "Plain", None)).await.unwrap();
        let starred = repo.create(&new_folder(owner, "Favorites", None)).await.unwrap();
        repo.set_starred(starred.id, true).await.unwrap();

        let options = NodeListOptions {
            starred: true,
            ..NodeListOptions::default()
        };
        let found = repo
            .list(owner, None, &options, &PageRequest::default())
            .await
            .unwrap();
        assert_eq!(found.items.len(), 1);
        assert_ne!(found.items[0].id, plain.id);
    }

    #[tokio::test]
    async fn child_ids_and_bulk_delete() {
        let (db, owner) = setup().await;
        let repo = FolderRepository::new(db.pool().clone());

        let root = repo.create(&new_folder(owner, "Root", None)).await.unwrap();
        let a = repo.create(&new_folder(owner, "A", Some(root.id))).await.unwrap();
        let b = repo.create(&new_folder(owner, "B", Some(root.id))).await.unwrap();

        let mut children = repo.child_folder_ids(owner, &[root.id]).await.unwrap();
        children.sort();
        assert_eq!(children, vec![a.id, b.id]);

        let deleted = repo.delete_by_ids(&[root.id, a.id, b.id]).await.unwrap();
        assert_eq!(deleted, 3);
        assert!(repo.find_by_id(root.id, owner).await.unwrap().is_none());
    }
}
