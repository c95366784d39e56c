use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use cirrus_core::events::ShareEvent;
use cirrus_core::types::{PageRequest, PageResponse};
use cirrus_core::{AppError, AppResult, ErrorKind};
use cirrus_database::{FileRepository, FolderRepository, ShareRepository, UserRepository};
use cirrus_entity::{NewShare, Share, SharePermission, ShareResource};

use crate::audit::AuditRecorder;
use crate::context::RequestContext;
use crate::share::access::ResourceSnapshot;
use crate::share::password::SharePasswordHasher;
use crate::share::token::TokenGenerator;

/// How many fresh tokens an insert will try when it collides with an
/// existing one before giving up.
const TOKEN_INSERT_ATTEMPTS: usize = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareRequest {
    pub resource: ShareResource,
    /// Email of the person the grant is addressed to. `None` makes a
    /// public link anyone holding the token can open.
    pub recipient_email: Option<String>,
    pub permission: SharePermission,
    pub expires_at: Option<DateTime<Utc>>,
    /// Plaintext password to gate the link with. Hashed before storage;
    /// `None` clears any password an existing grant had.
    pub password: Option<String>,
    pub download_enabled: bool,
}

/// One row of the "shared with me" view.
#[derive(Debug, Clone, Serialize)]
pub struct SharedEntry {
    pub share: Share,
    /// Redacted snapshot of the target; `None` if the row has vanished.
    pub resource: Option<ResourceSnapshot>,
}

/// Grant management from the owner's side of a share.
#[derive(Debug, Clone)]
pub struct ShareService {
    shares: Arc<ShareRepository>,
    files: Arc<FileRepository>,
    folders: Arc<FolderRepository>,
    users: Arc<UserRepository>,
    tokens: TokenGenerator,
    hasher: SharePasswordHasher,
    audit: AuditRecorder,
}

impl ShareService {
    pub fn new(
        shares: Arc<ShareRepository>,
        files: Arc<FileRepository>,
        folders: Arc<FolderRepository>,
        users: Arc<UserRepository>,
        audit: AuditRecorder,
    ) -> Self {
        Self {
            shares,
            files,
            folders,
            users,
            tokens: TokenGenerator::default(),
            hasher: SharePasswordHasher::new(),
            audit,
        }
    }

    /// Creates a grant, or updates the existing active one for the same
    /// (resource, creator, recipient) triple in place.
    ///
    /// Updates keep the token and view count so links already in
    /// circulation stay valid. Editor permission requires a recipient;
    /// public links are view-only.
    pub async fn create_or_update(
        &self,
        ctx: &RequestContext,
        request: ShareRequest,
    ) -> AppResult<Share> {
        let resource_uuid = self.owned_live_resource_uuid(ctx, request.resource).await?;

        let recipient_id = match request.recipient_email.as_deref() {
            Some(email) => {
                let user = self
                    .users
                    .find_by_email(email)
                    .await?
                    .ok_or_else(|| AppError::not_found(format!("No user with email {email}")))?;
                Some(user.id)
            }
            None => None,
        };

        if request.permission == SharePermission::Editor && recipient_id.is_none() {
            return Err(AppError::invalid_operation("Public share links are view-only"));
        }

        let password_hash = match request.password.as_deref() {
            Some(password) => Some(self.hasher.hash(password)?),
            None => None,
        };

        if let Some(existing) = self
            .shares
            .find_active_grant(ctx.user_id, request.resource, recipient_id)
            .await?
        {
            let updated = self
                .shares
                .update_grant(
                    existing.id,
                    request.permission,
                    request.expires_at,
                    password_hash.as_deref(),
                    request.download_enabled,
                )
                .await?;

            info!(user_id = ctx.user_id, share_id = updated.id, "Share grant updated");
            self.audit
                .emit(
                    ctx.user_id,
                    "share.update",
                    "share",
                    updated.id,
                    &ShareEvent::Updated {
                        share_uuid: updated.uuid,
                        permission: updated.permission.to_string(),
                    },
                )
                .await;

            return Ok(updated);
        }

        let mut conflict = None;
        for _ in 0..TOKEN_INSERT_ATTEMPTS {
            let data = NewShare {
                uuid: Uuid::new_v4(),
                token: self.tokens.generate(),
                resource: request.resource,
                created_by: ctx.user_id,
                recipient_id,
                permission: request.permission,
                expires_at: request.expires_at,
                password_hash: password_hash.clone(),
                download_enabled: request.download_enabled,
            };

            match self.shares.create(&data).await {
                Ok(share) => {
                    info!(
                        user_id = ctx.user_id,
                        share_id = share.id,
                        public = share.is_public(),
                        "Share grant created"
                    );
                    self.audit
                        .emit(
                            ctx.user_id,
                            "share.grant",
                            "share",
                            share.id,
                            &ShareEvent::Granted {
                                share_uuid: share.uuid,
                                resource_kind: request.resource.kind().to_string(),
                                resource_uuid,
                                recipient_id,
                                permission: share.permission.to_string(),
                                expires_at: share.expires_at,
                            },
                        )
                        .await;
                    return Ok(share);
                }
                Err(e) if e.kind == ErrorKind::Conflict => conflict = Some(e),
                Err(e) => return Err(e),
            }
        }

        Err(conflict
            .unwrap_or_else(|| AppError::conflict("Could not allocate a unique share token")))
    }

    /// Revokes every active grant the caller created on the resource.
    /// Grants are deactivated, never deleted, so the history survives.
    pub async fn revoke(&self, ctx: &RequestContext, resource: ShareResource) -> AppResult<u64> {
        let revoked = self
            .shares
            .deactivate_for_resource(ctx.user_id, resource)
            .await?;

        if revoked == 0 {
            return Err(AppError::not_found("No active shares for this resource"));
        }

        info!(user_id = ctx.user_id, revoked, "Share grants revoked");

        let resource_uuid = self.resource_uuid_any_state(ctx, resource).await?;
        self.audit
            .emit(
                ctx.user_id,
                "share.revoke",
                "share",
                0,
                &ShareEvent::Revoked {
                    resource_kind: resource.kind().to_string(),
                    resource_uuid,
                    revoked,
                },
            )
            .await;

        Ok(revoked)
    }

    /// Every grant the caller created on the resource, newest first,
    /// revoked ones included.
    pub async fn list_for_resource(
        &self,
        ctx: &RequestContext,
        resource: ShareResource,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Share>> {
        if self.resource_uuid_any_state(ctx, resource).await?.is_none() {
            return Err(AppError::not_found("Resource not found"));
        }

        self.shares.find_by_resource(ctx.user_id, resource, page).await
    }

    /// Active grants addressed to the caller, each with a redacted
    /// snapshot of its target.
    pub async fn shared_with_me(
        &self,
        ctx: &RequestContext,
        page: &PageRequest,
    ) -> AppResult<PageResponse<SharedEntry>> {
        let shares = self.shares.find_shared_with(ctx.user_id, page).await?;

        let mut entries = Vec::with_capacity(shares.items.len());
        for share in shares.items {
            let resource = match share.resource() {
                Some(ShareResource::File(id)) => self
                    .files
                    .find_by_id_unscoped(id)
                    .await?
                    .map(|f| ResourceSnapshot::from_file(&f)),
                Some(ShareResource::Folder(id)) => self
                    .folders
                    .find_by_id_unscoped(id)
                    .await?
                    .map(|f| ResourceSnapshot::from_folder(&f)),
                None => None,
            };
            entries.push(SharedEntry { share, resource });
        }

        Ok(PageResponse {
            items: entries,
            page: shares.page,
            page_size: shares.page_size,
            total_items: shares.total_items,
            total_pages: shares.total_pages,
            has_next: shares.has_next,
            has_previous: shares.has_previous,
        })
    }

    /// Verifies the caller owns the resource and that it is live, then
    /// returns its public UUID. Sharing a trashed node is `NotFound` just
    /// like sharing a missing one.
    async fn owned_live_resource_uuid(
        &self,
        ctx: &RequestContext,
        resource: ShareResource,
    ) -> AppResult<Uuid> {
        match resource {
            ShareResource::File(id) => {
                let file = self
                    .files
                    .find_by_id(id, ctx.user_id)
                    .await?
                    .filter(|f| !f.is_trashed())
                    .ok_or_else(|| AppError::not_found("File not found"))?;
                Ok(file.uuid)
            }
            ShareResource::Folder(id) => {
                let folder = self
                    .folders
                    .find_by_id(id, ctx.user_id)
                    .await?
                    .filter(|f| !f.is_trashed())
                    .ok_or_else(|| AppError::not_found("Folder not found"))?;
                Ok(folder.uuid)
            }
        }
    }

    async fn resource_uuid_any_state(
        &self,
        ctx: &RequestContext,
        resource: ShareResource,
    ) -> AppResult<Option<Uuid>> {
        Ok(match resource {
            ShareResource::File(id) => self
                .files
                .find_by_id(id, ctx.user_id)
                .await?
                .map(|f| f.uuid),
            ShareResource::Folder(id) => self
                .folders
                .find_by_id(id, ctx.user_id)
                .await?
                .map(|f| f.uuid),
        })
    }
}
