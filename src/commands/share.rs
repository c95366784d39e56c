//! Share grant CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use cirrus_core::types::PageRequest;
use cirrus_core::{AppError, AppResult};
use cirrus_entity::{Share, SharePermission, ShareResource};
use cirrus_service::{RequestContext, ShareRequest};

use crate::commands::{App, parse_timestamp, parse_uuid};
use crate::output::{self, OutputFormat};

/// Arguments for share commands
#[derive(Debug, Args)]
pub struct ShareArgs {
    /// Share subcommand
    #[command(subcommand)]
    pub command: ShareCommand,
}

/// Share subcommands
#[derive(Debug, Subcommand)]
pub enum ShareCommand {
    /// Create a share link, or refresh the existing grant
    Create {
        /// File UUID to share
        #[arg(long, conflicts_with = "folder")]
        file: Option<String>,
        /// Folder UUID to share
        #[arg(long)]
        folder: Option<String>,
        /// Recipient email (omit for a public link)
        #[arg(short, long)]
        to: Option<String>,
        /// Permission level
        #[arg(short, long, value_enum, default_value = "viewer")]
        permission: PermissionArg,
        /// Expiry timestamp, RFC 3339 (e.g. 2026-12-31T00:00:00Z)
        #[arg(short, long)]
        expires: Option<String>,
        /// Prompt for a link password
        #[arg(long)]
        password: bool,
        /// Disallow downloads through this link
        #[arg(long)]
        no_download: bool,
    },
    /// Revoke all active grants on a resource
    Revoke {
        /// File UUID
        #[arg(long, conflicts_with = "folder")]
        file: Option<String>,
        /// Folder UUID
        #[arg(long)]
        folder: Option<String>,
    },
    /// List the grants you created on a resource
    List {
        /// File UUID
        #[arg(long, conflicts_with = "folder")]
        file: Option<String>,
        /// Folder UUID
        #[arg(long)]
        folder: Option<String>,
        /// Page number
        #[arg(long, default_value = "1")]
        page: u64,
        /// Page size
        #[arg(long, default_value = "25")]
        page_size: u64,
    },
    /// Shares addressed to you
    Received {
        /// Page number
        #[arg(long, default_value = "1")]
        page: u64,
        /// Page size
        #[arg(long, default_value = "25")]
        page_size: u64,
    },
    /// Open a share link by token
    Open {
        /// Share token
        token: String,
        /// Prompt for the link password
        #[arg(long)]
        password: bool,
    },
}

/// Permission flag for share commands.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum PermissionArg {
    Viewer,
    Editor,
}

impl From<PermissionArg> for SharePermission {
    fn from(value: PermissionArg) -> Self {
        match value {
            PermissionArg::Viewer => SharePermission::Viewer,
            PermissionArg::Editor => SharePermission::Editor,
        }
    }
}

/// Share display row
#[derive(Debug, Serialize, Tabled)]
struct ShareRow {
    /// Token
    token: String,
    /// Recipient
    recipient: String,
    /// Permission
    permission: String,
    /// Active
    active: String,
    /// Expires
    expires: String,
    /// Views
    views: i64,
}

/// Received-share display row
#[derive(Debug, Serialize, Tabled)]
struct ReceivedRow {
    /// Token
    token: String,
    /// Kind
    kind: String,
    /// Name
    name: String,
    /// Permission
    permission: String,
    /// Shared at
    shared_at: String,
}

/// Execute share commands
pub async fn execute(
    args: &ShareArgs,
    app: &App,
    user: Option<&str>,
    format: OutputFormat,
) -> AppResult<()> {
    match &args.command {
        ShareCommand::Create {
            file,
            folder,
            to,
            permission,
            expires,
            password,
            no_download,
        } => {
            let ctx = app.context(user).await?;
            let resource = resolve_resource(app, &ctx, file.as_deref(), folder.as_deref()).await?;

            let expires_at = expires.as_deref().map(parse_timestamp).transpose()?;
            let password_value = if *password {
                Some(
                    dialoguer::Password::new()
                        .with_prompt("Link password")
                        .with_confirmation("Confirm password", "Passwords do not match")
                        .interact()
                        .map_err(|e| AppError::internal(format!("Input error: {}", e)))?,
                )
            } else {
                None
            };

            let share = app
                .shares
                .create_or_update(
                    &ctx,
                    ShareRequest {
                        resource,
                        recipient_email: to.clone(),
                        permission: (*permission).into(),
                        expires_at,
                        password: password_value,
                        download_enabled: !*no_download,
                    },
                )
                .await?;

            output::print_success(&format!("Share ready (token: {})", share.token));
            match &share.recipient_id {
                Some(_) => output::print_kv("Audience", to.as_deref().unwrap_or("-")),
                None => output::print_kv("Audience", "public (view-only)"),
            }
            if let Some(expires_at) = share.expires_at {
                output::print_kv("Expires", &expires_at.to_rfc3339());
            }
        }
        ShareCommand::Revoke { file, folder } => {
            let ctx = app.context(user).await?;
            let resource = resolve_resource(app, &ctx, file.as_deref(), folder.as_deref()).await?;

            let revoked = app.shares.revoke(&ctx, resource).await?;
            output::print_success(&format!("{} share grant(s) revoked", revoked));
        }
        ShareCommand::List {
            file,
            folder,
            page,
            page_size,
        } => {
            let ctx = app.context(user).await?;
            let resource = resolve_resource(app, &ctx, file.as_deref(), folder.as_deref()).await?;

            let result = app
                .shares
                .list_for_resource(&ctx, resource, &PageRequest::new(*page, *page_size))
                .await?;

            let mut rows = Vec::with_capacity(result.items.len());
            for share in &result.items {
                rows.push(share_row(app, share).await?);
            }
            output::print_page(&rows, &result, format);
        }
        ShareCommand::Received { page, page_size } => {
            let ctx = app.context(user).await?;
            let result = app
                .shares
                .shared_with_me(&ctx, &PageRequest::new(*page, *page_size))
                .await?;

            let rows: Vec<ReceivedRow> = result
                .items
                .iter()
                .map(|entry| ReceivedRow {
                    token: entry.share.token.clone(),
                    kind: entry
                        .resource
                        .as_ref()
                        .map(|r| r.kind.clone())
                        .unwrap_or_default(),
                    name: entry
                        .resource
                        .as_ref()
                        .map(|r| r.name.clone())
                        .unwrap_or_else(|| "(gone)".to_string()),
                    permission: entry.share.permission.to_string(),
                    shared_at: entry.share.created_at.format("%Y-%m-%d %H:%M").to_string(),
                })
                .collect();

            output::print_page(&rows, &result, format);
        }
        ShareCommand::Open { token, password } => {
            let password_value = if *password {
                Some(
                    dialoguer::Password::new()
                        .with_prompt("Link password")
                        .interact()
                        .map_err(|e| AppError::internal(format!("Input error: {}", e)))?,
                )
            } else {
                None
            };

            let resolved = app
                .share_access
                .resolve(token, password_value.as_deref())
                .await?;

            match format {
                OutputFormat::Json => output::print_item(&resolved, format),
                OutputFormat::Table => {
                    println!("Share '{}'", resolved.share.token);
                    output::print_kv("Kind", &resolved.resource.kind);
                    output::print_kv("Name", &resolved.resource.name);
                    if let Some(size) = resolved.resource.size {
                        output::print_kv("Size", &format!("{} bytes", size));
                    }
                    if let Some(mime) = &resolved.resource.mime_type {
                        output::print_kv("Type", mime);
                    }
                    output::print_kv("Permission", resolved.share.permission.as_str());
                    output::print_kv(
                        "Downloads",
                        if resolved.share.download_enabled {
                            "enabled"
                        } else {
                            "disabled"
                        },
                    );
                    output::print_kv("Views", &resolved.share.views.to_string());
                }
            }
        }
    }

    Ok(())
}

async fn share_row(app: &App, share: &Share) -> AppResult<ShareRow> {
    let recipient = match share.recipient_id {
        Some(id) => match app.users.find_by_id(id).await? {
            Some(user) => user.email,
            None => format!("user {}", id),
        },
        None => "public".to_string(),
    };

    Ok(ShareRow {
        token: share.token.clone(),
        recipient,
        permission: share.permission.to_string(),
        active: if share.is_active { "✓" } else { "" }.to_string(),
        expires: share
            .expires_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "never".to_string()),
        views: share.views,
    })
}

/// Resolves the `--file`/`--folder` flag pair to a share resource.
async fn resolve_resource(
    app: &App,
    ctx: &RequestContext,
    file: Option<&str>,
    folder: Option<&str>,
) -> AppResult<ShareResource> {
    match (file, folder) {
        (Some(value), None) => {
            let file = app.files.get_by_uuid(ctx, parse_uuid(value)?).await?;
            Ok(ShareResource::File(file.id))
        }
        (None, Some(value)) => {
            let folder = app.folders.get_by_uuid(ctx, parse_uuid(value)?).await?;
            Ok(ShareResource::Folder(folder.id))
        }
        _ => Err(AppError::invalid_operation(
            "Pass exactly one of --file or --folder",
        )),
    }
}
