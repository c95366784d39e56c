use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use cirrus_core::events::ResourceEvent;
use cirrus_core::{AppError, AppResult};
use cirrus_database::{FileRepository, FolderRepository, ShareRepository};
use cirrus_entity::{File, Folder};
use cirrus_storage::StorageRouter;

use crate::audit::AuditRecorder;
use crate::context::RequestContext;
use crate::folder::MAX_TREE_DEPTH;

/// Trash, restore, and permanent deletion.
///
/// Trashing is flat: a trashed folder's children keep their own state and
/// stay visible in live listings. Purging is the opposite and cascades
/// through every descendant regardless of state, because the subtree's
/// anchor row is about to disappear.
#[derive(Debug, Clone)]
pub struct TrashService {
    folders: Arc<FolderRepository>,
    files: Arc<FileRepository>,
    shares: Arc<ShareRepository>,
    storage: Arc<StorageRouter>,
    audit: AuditRecorder,
}

impl TrashService {
    pub fn new(
        folders: Arc<FolderRepository>,
        files: Arc<FileRepository>,
        shares: Arc<ShareRepository>,
        storage: Arc<StorageRouter>,
        audit: AuditRecorder,
    ) -> Self {
        Self {
            folders,
            files,
            shares,
            storage,
            audit,
        }
    }

    pub async fn trash_folder(&self, ctx: &RequestContext, id: i64) -> AppResult<Folder> {
        let folder = self.owned_folder(ctx, id).await?;
        if folder.is_trashed() {
            return Err(AppError::not_found("Folder not found"));
        }

        let trashed = self
            .folders
            .set_deleted_at(folder.id, Some(Utc::now()))
            .await?
            .ok_or_else(|| AppError::not_found("Folder not found"))?;

        info!(user_id = ctx.user_id, folder_id = trashed.id, "Folder trashed");
        self.audit
            .emit(
                ctx.user_id,
                "folder.trash",
                "folder",
                trashed.id,
                &ResourceEvent::Trashed {
                    node_uuid: trashed.uuid,
                },
            )
            .await;

        Ok(trashed)
    }

    /// Restores a trashed folder to the live tree. Restoring anything not
    /// currently trashed is `NotFound`.
    pub async fn restore_folder(&self, ctx: &RequestContext, id: i64) -> AppResult<Folder> {
        let folder = self.owned_folder(ctx, id).await?;
        if !folder.is_trashed() {
            return Err(AppError::not_found("Folder is not in the trash"));
        }

        let restored = self
            .folders
            .set_deleted_at(folder.id, None)
            .await?
            .ok_or_else(|| AppError::not_found("Folder not found"))?;

        info!(user_id = ctx.user_id, folder_id = restored.id, "Folder restored");
        self.audit
            .emit(
                ctx.user_id,
                "folder.restore",
                "folder",
                restored.id,
                &ResourceEvent::Restored {
                    node_uuid: restored.uuid,
                },
            )
            .await;

        Ok(restored)
    }

    pub async fn trash_file(&self, ctx: &RequestContext, id: i64) -> AppResult<File> {
        let file = self.owned_file(ctx, id).await?;
        if file.is_trashed() {
            return Err(AppError::not_found("File not found"));
        }

        let trashed = self
            .files
            .set_deleted_at(file.id, Some(Utc::now()))
            .await?
            .ok_or_else(|| AppError::not_found("File not found"))?;

        info!(user_id = ctx.user_id, file_id = trashed.id, "File trashed");
        self.audit
            .emit(
                ctx.user_id,
                "file.trash",
                "file",
                trashed.id,
                &ResourceEvent::Trashed {
                    node_uuid: trashed.uuid,
                },
            )
            .await;

        Ok(trashed)
    }

    pub async fn restore_file(&self, ctx: &RequestContext, id: i64) -> AppResult<File> {
        let file = self.owned_file(ctx, id).await?;
        if !file.is_trashed() {
            return Err(AppError::not_found("File is not in the trash"));
        }

        let restored = self
            .files
            .set_deleted_at(file.id, None)
            .await?
            .ok_or_else(|| AppError::not_found("File not found"))?;

        info!(user_id = ctx.user_id, file_id = restored.id, "File restored");
        self.audit
            .emit(
                ctx.user_id,
                "file.restore",
                "file",
                restored.id,
                &ResourceEvent::Restored {
                    node_uuid: restored.uuid,
                },
            )
            .await;

        Ok(restored)
    }

    /// Permanently deletes a file: bytes first, then the row. A storage
    /// failure is logged and the row is removed anyway, so purge never
    /// wedges on a flaky backend.
    pub async fn purge_file(&self, ctx: &RequestContext, id: i64) -> AppResult<()> {
        let file = self.owned_file(ctx, id).await?;
        self.destroy_file(ctx, &file).await
    }

    /// Permanently deletes a folder and everything beneath it, in any
    /// state. Grants on every destroyed node are revoked, never deleted.
    pub async fn purge_folder(&self, ctx: &RequestContext, id: i64) -> AppResult<()> {
        let folder = self.owned_folder(ctx, id).await?;
        let (folders, files) = self.destroy_folder_tree(ctx, &folder).await?;

        info!(
            user_id = ctx.user_id,
            folder_id = folder.id,
            folders,
            files,
            "Folder purged"
        );
        self.audit
            .emit(
                ctx.user_id,
                "folder.purge",
                "folder",
                folder.id,
                &ResourceEvent::Purged {
                    node_uuid: folder.uuid,
                    name: folder.name.clone(),
                },
            )
            .await;

        Ok(())
    }

    /// Purges everything in the caller's trash and returns how many
    /// trashed nodes were removed. An empty trash is zero, not an error.
    pub async fn empty_trash(&self, ctx: &RequestContext) -> AppResult<u64> {
        let trashed_files = self.files.find_trashed(ctx.user_id).await?;
        let trashed_folders = self.folders.find_trashed(ctx.user_id).await?;
        let count = (trashed_files.len() + trashed_folders.len()) as u64;

        for file in &trashed_files {
            self.destroy_file(ctx, file).await?;
        }

        for folder in &trashed_folders {
            // An earlier iteration may already have removed this folder as
            // a descendant of another trashed folder.
            let Some(current) = self.folders.find_by_id(folder.id, ctx.user_id).await? else {
                continue;
            };
            self.destroy_folder_tree(ctx, &current).await?;
        }

        info!(user_id = ctx.user_id, purged = count, "Trash emptied");
        self.audit
            .emit(
                ctx.user_id,
                "trash.empty",
                "user",
                ctx.user_id,
                &ResourceEvent::TrashEmptied { purged: count },
            )
            .await;

        Ok(count)
    }

    async fn destroy_file(&self, ctx: &RequestContext, file: &File) -> AppResult<()> {
        if let Err(e) = self.storage.delete(&file.storage_key).await {
            warn!(
                file_id = file.id,
                key = %file.storage_key,
                error = %e,
                "Failed to delete object during purge; removing row anyway"
            );
        }

        self.shares.deactivate_for_files(&[file.id]).await?;
        self.files.delete(file.id).await?;

        info!(user_id = ctx.user_id, file_id = file.id, "File purged");
        self.audit
            .emit(
                ctx.user_id,
                "file.purge",
                "file",
                file.id,
                &ResourceEvent::Purged {
                    node_uuid: file.uuid,
                    name: file.name.clone(),
                },
            )
            .await;

        Ok(())
    }

    /// Removes a folder subtree: object bytes, share grants, file rows,
    /// folder rows, in that order. Returns (folders, files) removed.
    async fn destroy_folder_tree(
        &self,
        ctx: &RequestContext,
        folder: &Folder,
    ) -> AppResult<(u64, u64)> {
        let folder_ids = self.descendant_folder_ids(ctx, folder.id).await?;
        let files = self.files.find_by_parent_ids(ctx.user_id, &folder_ids).await?;

        for file in &files {
            if let Err(e) = self.storage.delete(&file.storage_key).await {
                warn!(
                    file_id = file.id,
                    key = %file.storage_key,
                    error = %e,
                    "Failed to delete object during purge; removing row anyway"
                );
            }
        }

        let file_ids: Vec<i64> = files.iter().map(|f| f.id).collect();
        self.shares.deactivate_for_files(&file_ids).await?;
        self.shares.deactivate_for_folders(&folder_ids).await?;

        self.files.delete_by_ids(&file_ids).await?;
        self.folders.delete_by_ids(&folder_ids).await?;

        Ok((folder_ids.len() as u64, file_ids.len() as u64))
    }

    /// The folder plus every folder beneath it, found by walking the tree
    /// level by level.
    async fn descendant_folder_ids(
        &self,
        ctx: &RequestContext,
        root_id: i64,
    ) -> AppResult<Vec<i64>> {
        let mut all = vec![root_id];
        let mut frontier = vec![root_id];
        let mut depth = 0;

        while !frontier.is_empty() {
            depth += 1;
            if depth > MAX_TREE_DEPTH {
                return Err(AppError::invalid_operation("Folder tree is too deep"));
            }

            frontier = self.folders.child_folder_ids(ctx.user_id, &frontier).await?;
            all.extend(&frontier);
        }

        Ok(all)
    }

    async fn owned_folder(&self, ctx: &RequestContext, id: i64) -> AppResult<Folder> {
        self.folders
            .find_by_id(id, ctx.user_id)
            .await?
            .ok_or_else(|| AppError::not_found("Folder not found"))
    }

    async fn owned_file(&self, ctx: &RequestContext, id: i64) -> AppResult<File> {
        self.files
            .find_by_id(id, ctx.user_id)
            .await?
            .ok_or_else(|| AppError::not_found("File not found"))
    }
}
