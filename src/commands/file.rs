//! File management CLI commands.

use std::path::Path;
use std::time::Duration;

use bytes::Bytes;
use clap::{Args, Subcommand};
use futures::StreamExt;
use serde::Serialize;
use tabled::Tabled;
use tokio::io::AsyncWriteExt;

use cirrus_core::types::{NodeListOptions, PageRequest};
use cirrus_core::{AppError, AppResult};
use cirrus_entity::File;
use cirrus_service::{RequestContext, UploadRequest};

use crate::commands::{App, OrderArg, SortArg, parse_uuid};
use crate::output::{self, OutputFormat};

/// Arguments for file commands
#[derive(Debug, Args)]
pub struct FileArgs {
    /// File subcommand
    #[command(subcommand)]
    pub command: FileCommand,
}

/// File subcommands
#[derive(Debug, Subcommand)]
pub enum FileCommand {
    /// Upload a local file
    Upload {
        /// Path of the local file to upload
        path: String,
        /// Parent folder UUID (omit for the root level)
        #[arg(short, long)]
        parent: Option<String>,
        /// Name to store the file under (defaults to the local file name)
        #[arg(short, long)]
        name: Option<String>,
        /// Content type (guessed from the extension if omitted)
        #[arg(short, long)]
        mime: Option<String>,
    },
    /// List files
    List {
        /// Parent folder UUID (omit for the root level)
        #[arg(short, long)]
        parent: Option<String>,
        /// Show trashed files instead of live ones
        #[arg(long)]
        trashed: bool,
        /// Only starred files
        #[arg(long)]
        starred: bool,
        /// Case-insensitive name search across the whole tree
        #[arg(short, long)]
        search: Option<String>,
        /// Sort key
        #[arg(long, value_enum, default_value = "name")]
        sort: SortArg,
        /// Sort direction
        #[arg(long, value_enum, default_value = "asc")]
        order: OrderArg,
        /// Page number
        #[arg(long, default_value = "1")]
        page: u64,
        /// Page size
        #[arg(long, default_value = "25")]
        page_size: u64,
    },
    /// Show one file
    Show {
        /// File UUID
        uuid: String,
    },
    /// Rename a file
    Rename {
        /// File UUID
        uuid: String,
        /// New name
        name: String,
    },
    /// Move a file to a new parent folder
    Move {
        /// File UUID
        uuid: String,
        /// New parent folder UUID (omit for the root level)
        #[arg(short, long)]
        parent: Option<String>,
    },
    /// Toggle the star marker
    Star {
        /// File UUID
        uuid: String,
    },
    /// Download a file's content
    Download {
        /// File UUID
        uuid: String,
        /// Target path (defaults to the stored file name)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Print a signed direct-access URL
    Url {
        /// File UUID
        uuid: String,
        /// Lifetime in seconds (defaults to the configured TTL)
        #[arg(long)]
        ttl: Option<u64>,
    },
}

/// File display row
#[derive(Debug, Serialize, Tabled)]
struct FileRow {
    /// File UUID
    uuid: String,
    /// Name
    name: String,
    /// Size
    size: String,
    /// Content type
    mime: String,
    /// Starred
    starred: String,
    /// State
    state: String,
    /// Created at
    created_at: String,
}

/// Execute file commands
pub async fn execute(
    args: &FileArgs,
    app: &App,
    user: Option<&str>,
    format: OutputFormat,
) -> AppResult<()> {
    let ctx = app.context(user).await?;

    match &args.command {
        FileCommand::Upload {
            path,
            parent,
            name,
            mime,
        } => {
            let data = tokio::fs::read(path).await.map_err(|e| {
                AppError::storage_read(format!("Failed to read '{}': {}", path, e))
            })?;

            let file_name = match name {
                Some(n) => n.clone(),
                None => Path::new(path)
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map(str::to_string)
                    .ok_or_else(|| {
                        AppError::invalid_operation(format!(
                            "Cannot derive a file name from '{}'",
                            path
                        ))
                    })?,
            };

            let parent_id = resolve_parent(app, &ctx, parent.as_deref()).await?;
            let file = app
                .files
                .upload(
                    &ctx,
                    UploadRequest {
                        name: file_name,
                        parent_id,
                        mime_type: mime.clone(),
                        data: Bytes::from(data),
                    },
                )
                .await?;

            output::print_success(&format!(
                "File '{}' uploaded ({} bytes, uuid: {})",
                file.name, file.size, file.uuid
            ));
        }
        FileCommand::List {
            parent,
            trashed,
            starred,
            search,
            sort,
            order,
            page,
            page_size,
        } => {
            let parent_id = resolve_parent(app, &ctx, parent.as_deref()).await?;
            let options = NodeListOptions {
                trashed: *trashed,
                starred: *starred,
                search: search.clone(),
                sort: (*sort).into(),
                order: (*order).into(),
            };

            let result = app
                .files
                .list(&ctx, parent_id, &options, &PageRequest::new(*page, *page_size))
                .await?;

            let rows: Vec<FileRow> = result.items.iter().map(file_row).collect();
            output::print_page(&rows, &result, format);
        }
        FileCommand::Show { uuid } => {
            let file = app.files.get_by_uuid(&ctx, parse_uuid(uuid)?).await?;
            output::print_item(&file, format);
        }
        FileCommand::Rename { uuid, name } => {
            let file = app.files.get_by_uuid(&ctx, parse_uuid(uuid)?).await?;
            let renamed = app.files.rename(&ctx, file.id, name).await?;
            output::print_success(&format!("File renamed to '{}'", renamed.name));
        }
        FileCommand::Move { uuid, parent } => {
            let file = app.files.get_by_uuid(&ctx, parse_uuid(uuid)?).await?;
            let parent_id = resolve_parent(app, &ctx, parent.as_deref()).await?;
            app.files.move_file(&ctx, file.id, parent_id).await?;

            match parent {
                Some(p) => output::print_success(&format!("File moved under {}", p)),
                None => output::print_success("File moved to the root level"),
            }
        }
        FileCommand::Star { uuid } => {
            let file = app.files.get_by_uuid(&ctx, parse_uuid(uuid)?).await?;
            let updated = app.files.toggle_star(&ctx, file.id).await?;

            if updated.is_starred {
                output::print_success(&format!("File '{}' starred", updated.name));
            } else {
                output::print_success(&format!("File '{}' unstarred", updated.name));
            }
        }
        FileCommand::Download { uuid, output } => {
            let file = app.files.get_by_uuid(&ctx, parse_uuid(uuid)?).await?;
            let download = app.files.download(&ctx, file.id).await?;

            let target = output.clone().unwrap_or_else(|| download.file.name.clone());
            let mut writer = tokio::fs::File::create(&target).await.map_err(|e| {
                AppError::storage_write(format!("Failed to create '{}': {}", target, e))
            })?;

            let mut stream = download.stream;
            let mut written: u64 = 0;
            while let Some(chunk) = stream.next().await {
                let chunk = chunk
                    .map_err(|e| AppError::storage_read(format!("Stream error: {}", e)))?;
                written += chunk.len() as u64;
                writer.write_all(&chunk).await.map_err(|e| {
                    AppError::storage_write(format!("Failed to write '{}': {}", target, e))
                })?;
            }
            writer.flush().await.map_err(|e| {
                AppError::storage_write(format!("Failed to flush '{}': {}", target, e))
            })?;

            output::print_success(&format!(
                "Downloaded '{}' to '{}' ({} bytes)",
                download.file.name, target, written
            ));
        }
        FileCommand::Url { uuid, ttl } => {
            let file = app.files.get_by_uuid(&ctx, parse_uuid(uuid)?).await?;
            let url = app
                .files
                .signed_url(&ctx, file.id, ttl.map(Duration::from_secs))
                .await?;
            println!("{}", url);
        }
    }

    Ok(())
}

fn file_row(file: &File) -> FileRow {
    FileRow {
        uuid: file.uuid.to_string(),
        name: file.name.clone(),
        size: format_bytes(file.size),
        mime: file.mime_type.clone().unwrap_or_default(),
        starred: if file.is_starred { "★" } else { "" }.to_string(),
        state: if file.is_trashed() { "trashed" } else { "live" }.to_string(),
        created_at: file.created_at.format("%Y-%m-%d %H:%M").to_string(),
    }
}

/// Resolves an optional parent UUID flag to a folder id.
async fn resolve_parent(
    app: &App,
    ctx: &RequestContext,
    parent: Option<&str>,
) -> AppResult<Option<i64>> {
    match parent {
        Some(value) => {
            let folder = app.folders.get_by_uuid(ctx, parse_uuid(value)?).await?;
            Ok(Some(folder.id))
        }
        None => Ok(None),
    }
}

/// Format bytes into a human-readable string
fn format_bytes(bytes: i64) -> String {
    const KB: i64 = 1024;
    const MB: i64 = KB * 1024;
    const GB: i64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
