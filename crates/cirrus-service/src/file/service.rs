use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tracing::info;
use uuid::Uuid;

use cirrus_core::events::ResourceEvent;
use cirrus_core::traits::ByteStream;
use cirrus_core::types::{NodeListOptions, PageRequest, PageResponse};
use cirrus_core::{AppError, AppResult};
use cirrus_database::{FileRepository, FolderRepository};
use cirrus_entity::{File, Folder, NewFile};
use cirrus_storage::StorageRouter;

use crate::audit::AuditRecorder;
use crate::context::RequestContext;

/// A file to ingest: the metadata the caller knows plus the raw bytes.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub name: String,
    /// `None` places the file at the root of the owner's tree.
    pub parent_id: Option<i64>,
    /// Explicit content type; guessed from the extension when absent.
    pub mime_type: Option<String>,
    pub data: Bytes,
}

/// A download: the row metadata and the content stream behind it.
pub struct Download {
    pub file: File,
    pub content_type: String,
    pub stream: ByteStream,
}

impl std::fmt::Debug for Download {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Download")
            .field("file", &self.file)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// File operations, owner-scoped.
///
/// Uploads write bytes to the storage backend before any metadata row is
/// created, so a failed write never leaves a row pointing at nothing.
#[derive(Debug, Clone)]
pub struct FileService {
    files: Arc<FileRepository>,
    folders: Arc<FolderRepository>,
    storage: Arc<StorageRouter>,
    audit: AuditRecorder,
    signed_url_ttl: Duration,
}

impl FileService {
    pub fn new(
        files: Arc<FileRepository>,
        folders: Arc<FolderRepository>,
        storage: Arc<StorageRouter>,
        audit: AuditRecorder,
        signed_url_ttl: Duration,
    ) -> Self {
        Self {
            files,
            folders,
            storage,
            audit,
            signed_url_ttl,
        }
    }

    pub async fn upload(&self, ctx: &RequestContext, request: UploadRequest) -> AppResult<File> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(AppError::invalid_operation("File name cannot be empty"));
        }

        if let Some(parent_id) = request.parent_id {
            self.require_live_folder(ctx, parent_id).await?;
        }

        let file_uuid = Uuid::new_v4();
        let storage_key = format!("{}/{}/{}", ctx.user_id, file_uuid, name);
        let mime_type = request
            .mime_type
            .or_else(|| mime_from_name(name).map(str::to_string));

        // Bytes first. If the backend rejects the write there is no
        // metadata row to clean up afterwards.
        let stored = self
            .storage
            .put(&storage_key, request.data, mime_type.as_deref())
            .await?;

        let file = self
            .files
            .create(&NewFile {
                uuid: file_uuid,
                name: name.to_string(),
                owner_id: ctx.user_id,
                parent_id: request.parent_id,
                size: stored.size as i64,
                mime_type,
                storage_key: stored.key,
                storage_provider: self.storage.driver_name().to_string(),
            })
            .await?;

        info!(
            user_id = ctx.user_id,
            file_id = file.id,
            size = file.size,
            "File uploaded"
        );

        self.audit
            .emit(
                ctx.user_id,
                "file.upload",
                "file",
                file.id,
                &ResourceEvent::FileUploaded {
                    file_uuid: file.uuid,
                    name: file.name.clone(),
                    size: file.size,
                    mime_type: file.mime_type.clone(),
                    storage_provider: file.storage_provider.clone(),
                },
            )
            .await;

        Ok(file)
    }

    /// Fetches an owned file in any state, trashed included.
    pub async fn get(&self, ctx: &RequestContext, id: i64) -> AppResult<File> {
        self.files
            .find_by_id(id, ctx.user_id)
            .await?
            .ok_or_else(|| AppError::not_found("File not found"))
    }

    pub async fn get_by_uuid(&self, ctx: &RequestContext, uuid: Uuid) -> AppResult<File> {
        self.files
            .find_by_uuid(uuid, ctx.user_id)
            .await?
            .ok_or_else(|| AppError::not_found("File not found"))
    }

    /// Lists files under `parent_id` (`None` for the root level). Parent
    /// scope is ignored by the trash view and search, same as folders.
    pub async fn list(
        &self,
        ctx: &RequestContext,
        parent_id: Option<i64>,
        options: &NodeListOptions,
        page: &PageRequest,
    ) -> AppResult<PageResponse<File>> {
        if let Some(parent_id) = parent_id {
            if options.search.is_none() && !options.trashed {
                self.folders
                    .find_by_id(parent_id, ctx.user_id)
                    .await?
                    .ok_or_else(|| AppError::not_found("Folder not found"))?;
            }
        }

        self.files.list(ctx.user_id, parent_id, options, page).await
    }

    pub async fn rename(&self, ctx: &RequestContext, id: i64, new_name: &str) -> AppResult<File> {
        let name = new_name.trim();
        if name.is_empty() {
            return Err(AppError::invalid_operation("File name cannot be empty"));
        }

        let file = self.require_live(ctx, id).await?;
        let renamed = self
            .files
            .rename(file.id, name)
            .await?
            .ok_or_else(|| AppError::not_found("File not found"))?;

        self.audit
            .emit(
                ctx.user_id,
                "file.rename",
                "file",
                renamed.id,
                &ResourceEvent::Renamed {
                    node_uuid: renamed.uuid,
                    old_name: file.name,
                    new_name: renamed.name.clone(),
                },
            )
            .await;

        Ok(renamed)
    }

    /// Moves a file under a new parent folder, or to the root with `None`.
    pub async fn move_file(
        &self,
        ctx: &RequestContext,
        id: i64,
        new_parent_id: Option<i64>,
    ) -> AppResult<File> {
        let file = self.require_live(ctx, id).await?;

        let parent_uuid = match new_parent_id {
            Some(parent_id) => Some(self.require_live_folder(ctx, parent_id).await?.uuid),
            None => None,
        };

        let moved = self
            .files
            .set_parent(file.id, new_parent_id)
            .await?
            .ok_or_else(|| AppError::not_found("File not found"))?;

        info!(
            user_id = ctx.user_id,
            file_id = moved.id,
            parent_id = ?moved.parent_id,
            "File moved"
        );

        self.audit
            .emit(
                ctx.user_id,
                "file.move",
                "file",
                moved.id,
                &ResourceEvent::Moved {
                    node_uuid: moved.uuid,
                    parent_uuid,
                },
            )
            .await;

        Ok(moved)
    }

    pub async fn toggle_star(&self, ctx: &RequestContext, id: i64) -> AppResult<File> {
        let file = self.require_live(ctx, id).await?;
        let updated = self
            .files
            .set_starred(file.id, !file.is_starred)
            .await?
            .ok_or_else(|| AppError::not_found("File not found"))?;

        self.audit
            .emit(
                ctx.user_id,
                "file.star",
                "file",
                updated.id,
                &ResourceEvent::StarToggled {
                    node_uuid: updated.uuid,
                    starred: updated.is_starred,
                },
            )
            .await;

        Ok(updated)
    }

    /// Opens the file's content as a stream. Trashed files do not serve
    /// content; restore first.
    pub async fn download(&self, ctx: &RequestContext, id: i64) -> AppResult<Download> {
        let file = self.require_live(ctx, id).await?;
        let stream = self.storage.get(&file.storage_key).await?;

        let content_type = file
            .mime_type
            .clone()
            .unwrap_or_else(|| "application/octet-stream".to_string());

        Ok(Download {
            file,
            content_type,
            stream,
        })
    }

    /// A direct-access URL with the given lifetime, falling back to the
    /// configured default. Local storage yields an internal reference the
    /// serving layer resolves itself.
    pub async fn signed_url(
        &self,
        ctx: &RequestContext,
        id: i64,
        ttl: Option<Duration>,
    ) -> AppResult<String> {
        let file = self.require_live(ctx, id).await?;
        self.storage
            .signed_url(&file.storage_key, ttl.unwrap_or(self.signed_url_ttl))
            .await
    }

    async fn require_live(&self, ctx: &RequestContext, id: i64) -> AppResult<File> {
        let file = self.get(ctx, id).await?;
        if file.is_trashed() {
            return Err(AppError::not_found("File not found"));
        }
        Ok(file)
    }

    async fn require_live_folder(
        &self,
        ctx: &RequestContext,
        id: i64,
    ) -> AppResult<Folder> {
        let folder = self
            .folders
            .find_by_id(id, ctx.user_id)
            .await?
            .ok_or_else(|| AppError::not_found("Folder not found"))?;
        if folder.is_trashed() {
            return Err(AppError::not_found("Folder not found"));
        }
        Ok(folder)
    }
}

/// Best-effort content type from the file extension.
fn mime_from_name(name: &str) -> Option<&'static str> {
    let (_, extension) = name.rsplit_once('.')?;
    match extension.to_ascii_lowercase().as_str() {
        "txt" => Some("text/plain"),
        "html" | "htm" => Some("text/html"),
        "css" => Some("text/css"),
        "csv" => Some("text/csv"),
        "md" => Some("text/markdown"),
        "json" => Some("application/json"),
        "pdf" => Some("application/pdf"),
        "zip" => Some("application/zip"),
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "svg" => Some("image/svg+xml"),
        "webp" => Some("image/webp"),
        "mp3" => Some("audio/mpeg"),
        "mp4" => Some("video/mp4"),
        "doc" => Some("application/msword"),
        "docx" => {
            Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document")
        }
        "xls" => Some("application/vnd.ms-excel"),
        "xlsx" => Some("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
        _ => None,
    }
}
