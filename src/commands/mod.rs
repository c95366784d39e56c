//! CLI command definitions and dispatch.

pub mod audit;
pub mod file;
pub mod folder;
pub mod share;
pub mod storage;
pub mod trash;
pub mod user;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use uuid::Uuid;

use cirrus_core::config::AppConfig;
use cirrus_core::types::{NodeSortKey, SortDirection};
use cirrus_core::{AppError, AppResult};
use cirrus_database::{
    AuditLogRepository, DatabasePool, FileRepository, FolderRepository, ShareRepository,
    SqlAuditSink, UserRepository,
};
use cirrus_service::{
    AuditRecorder, FileService, FolderService, RequestContext, ShareAccessService, ShareService,
    TrashService,
};
use cirrus_storage::StorageRouter;

use crate::output::OutputFormat;

/// Cirrus Drive — multi-tenant file storage
#[derive(Debug, Parser)]
#[command(name = "cirrus", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default")]
    pub config: String,

    /// Email of the user to act as
    #[arg(short, long, global = true)]
    pub user: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table", global = true)]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Folder management
    Folder(folder::FolderArgs),
    /// File management
    File(file::FileArgs),
    /// Trash, restore, and permanent deletion
    Trash(trash::TrashArgs),
    /// Share links and grants
    Share(share::ShareArgs),
    /// User management
    User(user::UserArgs),
    /// Storage backend status
    Storage(storage::StorageArgs),
    /// Audit log
    Audit(audit::AuditArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let app = App::bootstrap(config).await?;
        let user = self.user.as_deref();

        match &self.command {
            Commands::Folder(args) => folder::execute(args, &app, user, self.format).await,
            Commands::File(args) => file::execute(args, &app, user, self.format).await,
            Commands::Trash(args) => trash::execute(args, &app, user, self.format).await,
            Commands::Share(args) => share::execute(args, &app, user, self.format).await,
            Commands::User(args) => user::execute(args, &app, self.format).await,
            Commands::Storage(args) => storage::execute(args, &app, self.format).await,
            Commands::Audit(args) => audit::execute(args, &app, self.format).await,
        }
    }
}

/// Everything a command needs, wired once per invocation.
pub struct App {
    pub db: DatabasePool,
    pub storage: Arc<StorageRouter>,
    pub users: Arc<UserRepository>,
    pub audit_log: AuditLogRepository,
    pub folders: FolderService,
    pub files: FileService,
    pub trash: TrashService,
    pub shares: ShareService,
    pub share_access: ShareAccessService,
}

impl App {
    pub async fn bootstrap(config: &AppConfig) -> AppResult<Self> {
        let db = DatabasePool::connect(&config.database).await?;
        let storage = Arc::new(StorageRouter::from_config(&config.storage).await?);

        let user_repo = Arc::new(UserRepository::new(db.pool().clone()));
        let folder_repo = Arc::new(FolderRepository::new(db.pool().clone()));
        let file_repo = Arc::new(FileRepository::new(db.pool().clone()));
        let share_repo = Arc::new(ShareRepository::new(db.pool().clone()));
        let audit_log = AuditLogRepository::new(db.pool().clone());

        let recorder = AuditRecorder::new(Arc::new(SqlAuditSink::new(audit_log.clone())));

        let folders = FolderService::new(Arc::clone(&folder_repo), recorder.clone());
        let files = FileService::new(
            Arc::clone(&file_repo),
            Arc::clone(&folder_repo),
            Arc::clone(&storage),
            recorder.clone(),
            Duration::from_secs(config.storage.signed_url_ttl_seconds),
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
            Arc::clone(&user_repo),
            recorder,
        );
        let share_access = ShareAccessService::new(
            Arc::clone(&share_repo),
            Arc::clone(&file_repo),
            Arc::clone(&folder_repo),
        );

        Ok(Self {
            db,
            storage,
            users: user_repo,
            audit_log,
            folders,
            files,
            trash,
            shares,
            share_access,
        })
    }

    /// Resolves the acting user from the global `--user` flag.
    pub async fn context(&self, user: Option<&str>) -> AppResult<RequestContext> {
        let email = user
            .ok_or_else(|| AppError::invalid_operation("Pass --user <email> to act as a user"))?;

        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or_else(|| AppError::not_found(format!("No user with email {email}")))?;

        Ok(RequestContext::for_user(&user))
    }
}

/// Sort key flag shared by the listing commands.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum SortArg {
    Name,
    Created,
    Updated,
    Size,
}

impl From<SortArg> for NodeSortKey {
    fn from(value: SortArg) -> Self {
        match value {
            SortArg::Name => NodeSortKey::Name,
            SortArg::Created => NodeSortKey::CreatedAt,
            SortArg::Updated => NodeSortKey::UpdatedAt,
            SortArg::Size => NodeSortKey::Size,
        }
    }
}

/// Sort direction flag shared by the listing commands.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OrderArg {
    Asc,
    Desc,
}

impl From<OrderArg> for SortDirection {
    fn from(value: OrderArg) -> Self {
        match value {
            OrderArg::Asc => SortDirection::Asc,
            OrderArg::Desc => SortDirection::Desc,
        }
    }
}

/// Helper: parse a UUID argument
pub fn parse_uuid(value: &str) -> AppResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|e| AppError::invalid_operation(format!("Invalid UUID '{value}': {e}")))
}

/// Helper: parse an RFC 3339 timestamp argument
pub fn parse_timestamp(value: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| AppError::invalid_operation(format!("Invalid timestamp '{value}': {e}")))
}
