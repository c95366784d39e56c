//! Trash and permanent deletion CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use cirrus_core::types::{NodeListOptions, PageRequest};
use cirrus_core::{AppError, AppResult};

use crate::commands::{App, parse_uuid};
use crate::output::{self, OutputFormat};

/// Arguments for trash commands
#[derive(Debug, Args)]
pub struct TrashArgs {
    /// Trash subcommand
    #[command(subcommand)]
    pub command: TrashCommand,
}

/// Trash subcommands
#[derive(Debug, Subcommand)]
pub enum TrashCommand {
    /// List everything in the trash
    List,
    /// Move a file to the trash
    File {
        /// File UUID
        uuid: String,
    },
    /// Move a folder to the trash
    Folder {
        /// Folder UUID
        uuid: String,
    },
    /// Restore a trashed file
    RestoreFile {
        /// File UUID
        uuid: String,
    },
    /// Restore a trashed folder
    RestoreFolder {
        /// Folder UUID
        uuid: String,
    },
    /// Permanently delete a file
    PurgeFile {
        /// File UUID
        uuid: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Permanently delete a folder and everything beneath it
    PurgeFolder {
        /// Folder UUID
        uuid: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Permanently delete everything in the trash
    Empty {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

/// Trash display row
#[derive(Debug, Serialize, Tabled)]
struct TrashRow {
    /// Kind
    kind: String,
    /// UUID
    uuid: String,
    /// Name
    name: String,
    /// Trashed at
    trashed_at: String,
}

/// Execute trash commands
pub async fn execute(
    args: &TrashArgs,
    app: &App,
    user: Option<&str>,
    format: OutputFormat,
) -> AppResult<()> {
    let ctx = app.context(user).await?;

    match &args.command {
        TrashCommand::List => {
            let options = NodeListOptions::trashed_only();
            let page = PageRequest::new(1, 100);

            let folders = app.folders.list(&ctx, None, &options, &page).await?;
            let files = app.files.list(&ctx, None, &options, &page).await?;

            let mut rows: Vec<TrashRow> = Vec::new();
            for folder in &folders.items {
                rows.push(TrashRow {
                    kind: "folder".to_string(),
                    uuid: folder.uuid.to_string(),
                    name: folder.name.clone(),
                    trashed_at: format_trashed_at(folder.deleted_at),
                });
            }
            for file in &files.items {
                rows.push(TrashRow {
                    kind: "file".to_string(),
                    uuid: file.uuid.to_string(),
                    name: file.name.clone(),
                    trashed_at: format_trashed_at(file.deleted_at),
                });
            }

            output::print_list(&rows, format);
        }
        TrashCommand::File { uuid } => {
            let file = app.files.get_by_uuid(&ctx, parse_uuid(uuid)?).await?;
            let trashed = app.trash.trash_file(&ctx, file.id).await?;
            output::print_success(&format!("File '{}' moved to the trash", trashed.name));
        }
        TrashCommand::Folder { uuid } => {
            let folder = app.folders.get_by_uuid(&ctx, parse_uuid(uuid)?).await?;
            let trashed = app.trash.trash_folder(&ctx, folder.id).await?;
            output::print_success(&format!("Folder '{}' moved to the trash", trashed.name));
        }
        TrashCommand::RestoreFile { uuid } => {
            let file = app.files.get_by_uuid(&ctx, parse_uuid(uuid)?).await?;
            let restored = app.trash.restore_file(&ctx, file.id).await?;
            output::print_success(&format!("File '{}' restored", restored.name));
        }
        TrashCommand::RestoreFolder { uuid } => {
            let folder = app.folders.get_by_uuid(&ctx, parse_uuid(uuid)?).await?;
            let restored = app.trash.restore_folder(&ctx, folder.id).await?;
            output::print_success(&format!("Folder '{}' restored", restored.name));
        }
        TrashCommand::PurgeFile { uuid, yes } => {
            let file = app.files.get_by_uuid(&ctx, parse_uuid(uuid)?).await?;

            if !confirm(*yes, &format!("Permanently delete file '{}'?", file.name))? {
                output::print_warning("Aborted");
                return Ok(());
            }

            app.trash.purge_file(&ctx, file.id).await?;
            output::print_success(&format!("File '{}' permanently deleted", file.name));
        }
        TrashCommand::PurgeFolder { uuid, yes } => {
            let folder = app.folders.get_by_uuid(&ctx, parse_uuid(uuid)?).await?;

            let prompt = format!(
                "Permanently delete folder '{}' and everything beneath it?",
                folder.name
            );
            if !confirm(*yes, &prompt)? {
                output::print_warning("Aborted");
                return Ok(());
            }

            app.trash.purge_folder(&ctx, folder.id).await?;
            output::print_success(&format!("Folder '{}' permanently deleted", folder.name));
        }
        TrashCommand::Empty { yes } => {
            if !confirm(*yes, "Permanently delete everything in the trash?")? {
                output::print_warning("Aborted");
                return Ok(());
            }

            let purged = app.trash.empty_trash(&ctx).await?;
            if purged == 0 {
                output::print_success("Trash was already empty");
            } else {
                output::print_success(&format!("Trash emptied ({} items purged)", purged));
            }
        }
    }

    Ok(())
}

fn format_trashed_at(deleted_at: Option<chrono::DateTime<chrono::Utc>>) -> String {
    deleted_at
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

fn confirm(skip: bool, prompt: &str) -> AppResult<bool> {
    if skip {
        return Ok(true);
    }

    dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(|e| AppError::internal(format!("Input error: {}", e)))
}
