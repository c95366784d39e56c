use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use cirrus_core::events::ResourceEvent;
use cirrus_core::types::{NodeListOptions, PageRequest, PageResponse};
use cirrus_core::{AppError, AppResult};
use cirrus_database::FolderRepository;
use cirrus_entity::{Folder, NewFolder};

use crate::audit::AuditRecorder;
use crate::context::RequestContext;

/// Upper bound on the tree walks. Anything deeper than this is treated as
/// corrupt rather than walked forever.
pub(crate) const MAX_TREE_DEPTH: usize = 1000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFolderRequest {
    pub name: String,
    /// `None` creates the folder at the root of the owner's tree.
    pub parent_id: Option<i64>,
}

/// Folder CRUD and tree navigation, all scoped to the calling owner.
///
/// Missing and foreign nodes are indistinguishable: both come back as
/// `NotFound`, and trashed nodes are hidden from every operation except
/// the trash views.
#[derive(Debug, Clone)]
pub struct FolderService {
    folders: Arc<FolderRepository>,
    audit: AuditRecorder,
}

impl FolderService {
    pub fn new(folders: Arc<FolderRepository>, audit: AuditRecorder) -> Self {
        Self { folders, audit }
    }

    pub async fn create(
        &self,
        ctx: &RequestContext,
        request: CreateFolderRequest,
    ) -> AppResult<Folder> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(AppError::invalid_operation("Folder name cannot be empty"));
        }

        let parent_uuid = match request.parent_id {
            Some(parent_id) => Some(self.require_live(ctx, parent_id).await?.uuid),
            None => None,
        };

        let folder = self
            .folders
            .create(&NewFolder {
                uuid: Uuid::new_v4(),
                name: name.to_string(),
                owner_id: ctx.user_id,
                parent_id: request.parent_id,
            })
            .await?;

        info!(user_id = ctx.user_id, folder_id = folder.id, name = %folder.name, "Folder created");

        self.audit
            .emit(
                ctx.user_id,
                "folder.create",
                "folder",
                folder.id,
                &ResourceEvent::FolderCreated {
                    folder_uuid: folder.uuid,
                    name: folder.name.clone(),
                    parent_uuid,
                },
            )
            .await;

        Ok(folder)
    }

    /// Fetches an owned folder in any state, trashed included.
    pub async fn get(&self, ctx: &RequestContext, id: i64) -> AppResult<Folder> {
        self.folders
            .find_by_id(id, ctx.user_id)
            .await?
            .ok_or_else(|| AppError::not_found("Folder not found"))
    }

    pub async fn get_by_uuid(&self, ctx: &RequestContext, uuid: Uuid) -> AppResult<Folder> {
        self.folders
            .find_by_uuid(uuid, ctx.user_id)
            .await?
            .ok_or_else(|| AppError::not_found("Folder not found"))
    }

    /// Lists child folders of `parent_id` (`None` for the root level).
    ///
    /// The parent is only required to exist for plain listings: the trash
    /// view and search deliberately ignore parent scope, so no parent
    /// check applies there.
    pub async fn list(
        &self,
        ctx: &RequestContext,
        parent_id: Option<i64>,
        options: &NodeListOptions,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Folder>> {
        if let Some(parent_id) = parent_id {
            if options.search.is_none() && !options.trashed {
                self.get(ctx, parent_id).await?;
            }
        }

        self.folders.list(ctx.user_id, parent_id, options, page).await
    }

    pub async fn rename(&self, ctx: &RequestContext, id: i64, new_name: &str) -> AppResult<Folder> {
        let name = new_name.trim();
        if name.is_empty() {
            return Err(AppError::invalid_operation("Folder name cannot be empty"));
        }

        let folder = self.require_live(ctx, id).await?;
        let renamed = self
            .folders
            .rename(folder.id, name)
            .await?
            .ok_or_else(|| AppError::not_found("Folder not found"))?;

        self.audit
            .emit(
                ctx.user_id,
                "folder.rename",
                "folder",
                renamed.id,
                &ResourceEvent::Renamed {
                    node_uuid: renamed.uuid,
                    old_name: folder.name,
                    new_name: renamed.name.clone(),
                },
            )
            .await;

        Ok(renamed)
    }

    /// Moves a folder under a new parent, or to the root with `None`.
    ///
    /// A folder can never move into itself or into one of its own
    /// descendants; both are `InvalidOperation`.
    pub async fn move_folder(
        &self,
        ctx: &RequestContext,
        id: i64,
        new_parent_id: Option<i64>,
    ) -> AppResult<Folder> {
        let folder = self.require_live(ctx, id).await?;

        if let Some(target_id) = new_parent_id {
            if target_id == folder.id {
                return Err(AppError::invalid_operation("Cannot move a folder into itself"));
            }

            let target = self.require_live(ctx, target_id).await?;
            if self.ancestor_ids(ctx, &target).await?.contains(&folder.id) {
                return Err(AppError::invalid_operation(
                    "Cannot move a folder into one of its descendants",
                ));
            }
        }

        let moved = self
            .folders
            .set_parent(folder.id, new_parent_id)
            .await?
            .ok_or_else(|| AppError::not_found("Folder not found"))?;

        info!(
            user_id = ctx.user_id,
            folder_id = moved.id,
            parent_id = ?moved.parent_id,
            "Folder moved"
        );

        let parent_uuid = match moved.parent_id {
            Some(parent_id) => Some(self.get(ctx, parent_id).await?.uuid),
            None => None,
        };
        self.audit
            .emit(
                ctx.user_id,
                "folder.move",
                "folder",
                moved.id,
                &ResourceEvent::Moved {
                    node_uuid: moved.uuid,
                    parent_uuid,
                },
            )
            .await;

        Ok(moved)
    }

    /// The chain from the root of the tree down to the folder, inclusive.
    pub async fn ancestry(&self, ctx: &RequestContext, id: i64) -> AppResult<Vec<Folder>> {
        let folder = self.get(ctx, id).await?;

        let mut chain = vec![folder];
        loop {
            let Some(parent_id) = chain.last().and_then(|f| f.parent_id) else {
                break;
            };

            if chain.len() > MAX_TREE_DEPTH {
                return Err(AppError::invalid_operation("Folder tree is too deep"));
            }

            let parent = self
                .folders
                .find_by_id(parent_id, ctx.user_id)
                .await?
                .ok_or_else(|| AppError::not_found("Folder not found"))?;
            chain.push(parent);
        }

        chain.reverse();
        Ok(chain)
    }

    pub async fn toggle_star(&self, ctx: &RequestContext, id: i64) -> AppResult<Folder> {
        let folder = self.require_live(ctx, id).await?;
        let updated = self
            .folders
            .set_starred(folder.id, !folder.is_starred)
            .await?
            .ok_or_else(|| AppError::not_found("Folder not found"))?;

        self.audit
            .emit(
                ctx.user_id,
                "folder.star",
                "folder",
                updated.id,
                &ResourceEvent::StarToggled {
                    node_uuid: updated.uuid,
                    starred: updated.is_starred,
                },
            )
            .await;

        Ok(updated)
    }

    async fn require_live(&self, ctx: &RequestContext, id: i64) -> AppResult<Folder> {
        let folder = self.get(ctx, id).await?;
        if folder.is_trashed() {
            return Err(AppError::not_found("Folder not found"));
        }
        Ok(folder)
    }

    /// Ids of every folder above this one, nearest parent first.
    async fn ancestor_ids(&self, ctx: &RequestContext, folder: &Folder) -> AppResult<Vec<i64>> {
        let mut ids = Vec::new();
        let mut current_parent = folder.parent_id;

        while let Some(parent_id) = current_parent {
            if ids.len() >= MAX_TREE_DEPTH {
                return Err(AppError::invalid_operation("Folder tree is too deep"));
            }

            let parent = self
                .folders
                .find_by_id(parent_id, ctx.user_id)
                .await?
                .ok_or_else(|| AppError::not_found("Folder not found"))?;
            ids.push(parent.id);
            current_parent = parent.parent_id;
        }

        Ok(ids)
    }
}
