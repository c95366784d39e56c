use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use cirrus_core::{AppError, AppResult};
use cirrus_database::{FileRepository, FolderRepository, ShareRepository};
use cirrus_entity::{File, Folder, Share, ShareResource};

use crate::share::password::SharePasswordHasher;

/// What a link holder is allowed to see about a shared resource. The
/// storage key and owner identity never leave the service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceSnapshot {
    pub kind: String,
    pub uuid: Uuid,
    pub name: String,
    pub mime_type: Option<String>,
    pub size: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ResourceSnapshot {
    pub fn from_file(file: &File) -> Self {
        Self {
            kind: "file".to_string(),
            uuid: file.uuid,
            name: file.name.clone(),
            mime_type: file.mime_type.clone(),
            size: Some(file.size),
            created_at: file.created_at,
            updated_at: file.updated_at,
        }
    }

    pub fn from_folder(folder: &Folder) -> Self {
        Self {
            kind: "folder".to_string(),
            uuid: folder.uuid,
            name: folder.name.clone(),
            mime_type: None,
            size: None,
            created_at: folder.created_at,
            updated_at: folder.updated_at,
        }
    }
}

/// A successful token resolution.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedShare {
    pub share: Share,
    pub resource: ResourceSnapshot,
}

/// Anonymous share-link resolution. There is no request context here; the
/// token itself is the credential.
#[derive(Debug, Clone)]
pub struct ShareAccessService {
    shares: Arc<ShareRepository>,
    files: Arc<FileRepository>,
    folders: Arc<FolderRepository>,
    hasher: SharePasswordHasher,
}

impl ShareAccessService {
    pub fn new(
        shares: Arc<ShareRepository>,
        files: Arc<FileRepository>,
        folders: Arc<FolderRepository>,
    ) -> Self {
        Self {
            shares,
            files,
            folders,
            hasher: SharePasswordHasher::new(),
        }
    }

    /// Resolves a token to its grant and a redacted resource snapshot.
    ///
    /// An expired grant is deactivated the first time it is touched and
    /// from then on behaves exactly like an unknown token. A missing or
    /// wrong password is `Unauthorized`, checked before the resource is
    /// loaded and without counting a view.
    pub async fn resolve(&self, token: &str, password: Option<&str>) -> AppResult<ResolvedShare> {
        let share = self
            .shares
            .find_by_token(token)
            .await?
            .ok_or_else(|| AppError::not_found("Share link not found"))?;

        if share.is_expired(Utc::now()) {
            self.shares.deactivate(share.id).await?;
            return Err(AppError::not_found("Share link not found"));
        }

        if let Some(hash) = share.password_hash.as_deref() {
            let supplied = password.ok_or_else(|| AppError::unauthorized("Password required"))?;
            if !self.hasher.verify(supplied, hash)? {
                return Err(AppError::unauthorized("Invalid share password"));
            }
        }

        let resource = self.load_snapshot(&share).await?;

        // Best-effort view counting; a failed bump never blocks access.
        if let Err(e) = self.shares.increment_views(share.id).await {
            warn!(share_id = share.id, error = %e, "Failed to record share view");
        }

        Ok(ResolvedShare { share, resource })
    }

    /// Loads the grant's target. A trashed or vanished resource makes the
    /// link behave as if it never existed.
    async fn load_snapshot(&self, share: &Share) -> AppResult<ResourceSnapshot> {
        let snapshot = match share.resource() {
            Some(ShareResource::File(id)) => self
                .files
                .find_by_id_unscoped(id)
                .await?
                .filter(|f| !f.is_trashed())
                .map(|f| ResourceSnapshot::from_file(&f)),
            Some(ShareResource::Folder(id)) => self
                .folders
                .find_by_id_unscoped(id)
                .await?
                .filter(|f| !f.is_trashed())
                .map(|f| ResourceSnapshot::from_folder(&f)),
            None => None,
        };

        snapshot.ok_or_else(|| AppError::not_found("Share link not found"))
    }
}
