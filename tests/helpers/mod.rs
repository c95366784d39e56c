//! Shared test helpers for integration tests.

// Each test binary compiles this module on its own, so not every helper
// is used in all of them.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tempfile::TempDir;
use uuid::Uuid;

use cirrus_core::traits::ObjectStore;
use cirrus_database::{
    AuditLogRepository, DatabasePool, FileRepository, FolderRepository, ShareRepository,
    SqlAuditSink, UserRepository,
};
use cirrus_entity::{File, Folder, NewUser};
use cirrus_service::{
    AuditRecorder, CreateFolderRequest, FileService, FolderService, RequestContext,
    ShareAccessService, ShareService, TrashService, UploadRequest,
};
use cirrus_storage::{LocalObjectStore, StorageRouter};

/// Test application context wiring every service against an in-memory
/// database and a throwaway on-disk object store.
pub struct TestApp {
    /// Database handle for direct queries
    pub db: DatabasePool,
    /// Storage router backing the file service
    pub storage: Arc<StorageRouter>,
    /// User repository
    pub users: Arc<UserRepository>,
    /// Folder repository, for assertions past the service layer
    pub folder_repo: Arc<FolderRepository>,
    /// File repository, for assertions past the service layer
    pub file_repo: Arc<FileRepository>,
    /// Share repository, for assertions past the service layer
    pub share_repo: Arc<ShareRepository>,
    /// Audit log repository
    pub audit_log: AuditLogRepository,
    /// Folder tree service
    pub folders: FolderService,
    /// File service
    pub files: FileService,
    /// Trash lifecycle service
    pub trash: TrashService,
    /// Share grant service
    pub shares: ShareService,
    /// Token resolution service
    pub share_access: ShareAccessService,
    // Keeps the storage root alive for the duration of the test.
    _storage_dir: Option<TempDir>,
}

impl TestApp {
    /// Create a new test application backed by a local object store.
    pub async fn new() -> Self {
        let storage_dir = tempfile::tempdir().expect("Failed to create storage dir");
        let store = LocalObjectStore::new(storage_dir.path())
            .await
            .expect("Failed to init local store");

        Self::with_store(Arc::new(store), Some(storage_dir)).await
    }

    /// Create a test application around an arbitrary object store.
    pub async fn with_store(store: Arc<dyn ObjectStore>, storage_dir: Option<TempDir>) -> Self {
        let db = DatabasePool::open_in_memory()
            .await
            .expect("Failed to open in-memory database");

        let storage = Arc::new(StorageRouter::with_store(store));

        let pool = db.pool().clone();
        let users = Arc::new(UserRepository::new(pool.clone()));
        let folder_repo = Arc::new(FolderRepository::new(pool.clone()));
        let file_repo = Arc::new(FileRepository::new(pool.clone()));
        let share_repo = Arc::new(ShareRepository::new(pool.clone()));
        let audit_log = AuditLogRepository::new(pool);
        let recorder = AuditRecorder::new(Arc::new(SqlAuditSink::new(audit_log.clone())));

        let folders = FolderService::new(Arc::clone(&folder_repo), recorder.clone());
        let files = FileService::new(
            Arc::clone(&file_repo),
            Arc::clone(&folder_repo),
            Arc::clone(&storage),
            recorder.clone(),
            Duration::from_secs(900),
        );
        let trash = TrashService::new(
            Arc::clone(&folder_repo),
            Arc::clone(&file_repo),
            Arc::clone(&share_repo),
            Arc::clone(&storage),
            recorder.clone(),
        );
        let shares = ShareService::new(
            Arc::clone(&share_repo),
            Arc::clone(&file_repo),
            Arc::clone(&folder_repo),
            Arc::clone(&users),
            recorder,
        );
        let share_access = ShareAccessService::new(
            Arc::clone(&share_repo),
            Arc::clone(&file_repo),
            Arc::clone(&folder_repo),
        );

        Self {
            db,
            storage,
            users,
            folder_repo,
            file_repo,
            share_repo,
            audit_log,
            folders,
            files,
            trash,
            shares,
            share_access,
            _storage_dir: storage_dir,
        }
    }

    /// Create a test user and return an acting context for them.
    pub async fn create_test_user(&self, email: &str) -> RequestContext {
        let name = email.split('@').next().unwrap_or(email).to_string();
        let user = self
            .users
            .create(&NewUser {
                uuid: Uuid::new_v4(),
                email: email.to_string(),
                display_name: name,
            })
            .await
            .expect("Failed to create test user");

        RequestContext::for_user(&user)
    }

    /// Create a folder owned by the context user.
    pub async fn create_folder(
        &self,
        ctx: &RequestContext,
        name: &str,
        parent_id: Option<i64>,
    ) -> Folder {
        self.folders
            .create(
                ctx,
                CreateFolderRequest {
                    name: name.to_string(),
                    parent_id,
                },
            )
            .await
            .expect("Failed to create test folder")
    }

    /// Upload a small text file under the given parent.
    pub async fn upload_text(
        &self,
        ctx: &RequestContext,
        name: &str,
        parent_id: Option<i64>,
        body: &str,
    ) -> File {
        self.files
            .upload(
                ctx,
                UploadRequest {
                    name: name.to_string(),
                    parent_id,
                    mime_type: None,
                    data: Bytes::from(body.to_string()),
                },
            )
            .await
            .expect("Failed to upload test file")
    }
}
