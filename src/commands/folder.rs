//! Folder management CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use cirrus_core::AppResult;
use cirrus_core::types::{NodeListOptions, PageRequest};
use cirrus_entity::Folder;
use cirrus_service::{CreateFolderRequest, RequestContext};

use crate::commands::{App, OrderArg, SortArg, parse_uuid};
use crate::output::{self, OutputFormat};

/// Arguments for folder commands
#[derive(Debug, Args)]
pub struct FolderArgs {
    /// Folder subcommand
    #[command(subcommand)]
    pub command: FolderCommand,
}

/// Folder subcommands
#[derive(Debug, Subcommand)]
pub enum FolderCommand {
    /// Create a folder
    Create {
        /// Folder name
        name: String,
        /// Parent folder UUID (omit for the root level)
        #[arg(short, long)]
        parent: Option<String>,
    },
    /// List folders
    List {
        /// Parent folder UUID (omit for the root level)
        #[arg(short, long)]
        parent: Option<String>,
        /// Show trashed folders instead of live ones
        #[arg(long)]
        trashed: bool,
        /// Only starred folders
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
    /// Show one folder
    Show {
        /// Folder UUID
        uuid: String,
    },
    /// Rename a folder
    Rename {
        /// Folder UUID
        uuid: String,
        /// New name
        name: String,
    },
    /// Move a folder to a new parent
    Move {
        /// Folder UUID
        uuid: String,
        /// New parent folder UUID (omit for the root level)
        #[arg(short, long)]
        parent: Option<String>,
    },
    /// Toggle the star marker
    Star {
        /// Folder UUID
        uuid: String,
    },
    /// Show the path from the root down to a folder
    Path {
        /// Folder UUID
        uuid: String,
    },
}

/// Folder display row
#[derive(Debug, Serialize, Tabled)]
struct FolderRow {
    /// Folder UUID
    uuid: String,
    /// Name
    name: String,
    /// Starred
    starred: String,
    /// State
    state: String,
    /// Created at
    created_at: String,
}

/// Execute folder commands
pub async fn execute(
    args: &FolderArgs,
    app: &App,
    user: Option<&str>,
    format: OutputFormat,
) -> AppResult<()> {
    let ctx = app.context(user).await?;

    match &args.command {
        FolderCommand::Create { name, parent } => {
            let parent_id = resolve_parent(app, &ctx, parent.as_deref()).await?;
            let folder = app
                .folders
                .create(
                    &ctx,
                    CreateFolderRequest {
                        name: name.clone(),
                        parent_id,
                    },
                )
                .await?;

            output::print_success(&format!(
                "Folder '{}' created (uuid: {})",
                folder.name, folder.uuid
            ));
        }
        FolderCommand::List {
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
                .folders
                .list(&ctx, parent_id, &options, &PageRequest::new(*page, *page_size))
                .await?;

            let rows: Vec<FolderRow> = result.items.iter().map(folder_row).collect();
            output::print_page(&rows, &result, format);
        }
        FolderCommand::Show { uuid } => {
            let folder = app.folders.get_by_uuid(&ctx, parse_uuid(uuid)?).await?;
            output::print_item(&folder, format);
        }
        FolderCommand::Rename { uuid, name } => {
            let folder = app.folders.get_by_uuid(&ctx, parse_uuid(uuid)?).await?;
            let renamed = app.folders.rename(&ctx, folder.id, name).await?;
            output::print_success(&format!("Folder renamed to '{}'", renamed.name));
        }
        FolderCommand::Move { uuid, parent } => {
            let folder = app.folders.get_by_uuid(&ctx, parse_uuid(uuid)?).await?;
            let parent_id = resolve_parent(app, &ctx, parent.as_deref()).await?;
            app.folders.move_folder(&ctx, folder.id, parent_id).await?;

            match parent {
                Some(p) => output::print_success(&format!("Folder moved under {}", p)),
                None => output::print_success("Folder moved to the root level"),
            }
        }
        FolderCommand::Star { uuid } => {
            let folder = app.folders.get_by_uuid(&ctx, parse_uuid(uuid)?).await?;
            let updated = app.folders.toggle_star(&ctx, folder.id).await?;

            if updated.is_starred {
                output::print_success(&format!("Folder '{}' starred", updated.name));
            } else {
                output::print_success(&format!("Folder '{}' unstarred", updated.name));
            }
        }
        FolderCommand::Path { uuid } => {
            let folder = app.folders.get_by_uuid(&ctx, parse_uuid(uuid)?).await?;
            let chain = app.folders.ancestry(&ctx, folder.id).await?;

            let path = chain
                .iter()
                .map(|f| f.name.as_str())
                .collect::<Vec<_>>()
                .join("/");
            println!("/{}", path);
        }
    }

    Ok(())
}

fn folder_row(folder: &Folder) -> FolderRow {
    FolderRow {
        uuid: folder.uuid.to_string(),
        name: folder.name.clone(),
        starred: if folder.is_starred { "★" } else { "" }.to_string(),
        state: if folder.is_trashed() { "trashed" } else { "live" }.to_string(),
        created_at: folder.created_at.format("%Y-%m-%d %H:%M").to_string(),
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
