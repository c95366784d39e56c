//! Audit log CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use cirrus_core::AppResult;
use cirrus_core::types::PageRequest;

use crate::commands::App;
use crate::output::{self, OutputFormat};

/// Arguments for audit commands
#[derive(Debug, Args)]
pub struct AuditArgs {
    /// Audit subcommand
    #[command(subcommand)]
    pub command: AuditCommand,
}

/// Audit subcommands
#[derive(Debug, Subcommand)]
pub enum AuditCommand {
    /// Show recent audit entries, newest first
    List {
        /// Page number
        #[arg(long, default_value = "1")]
        page: u64,
        /// Page size
        #[arg(long, default_value = "25")]
        page_size: u64,
    },
}

/// Audit display row
#[derive(Debug, Serialize, Tabled)]
struct AuditRow {
    /// Entry ID
    id: i64,
    /// Actor
    actor: i64,
    /// Action
    action: String,
    /// Target
    target: String,
    /// Recorded at
    recorded_at: String,
}

/// Execute audit commands
pub async fn execute(args: &AuditArgs, app: &App, format: OutputFormat) -> AppResult<()> {
    match &args.command {
        AuditCommand::List { page, page_size } => {
            let result = app
                .audit_log
                .recent(&PageRequest::new(*page, *page_size))
                .await?;

            let rows: Vec<AuditRow> = result
                .items
                .iter()
                .map(|entry| AuditRow {
                    id: entry.id,
                    actor: entry.actor_id,
                    action: entry.action.clone(),
                    target: format!("{} {}", entry.target_type, entry.target_id),
                    recorded_at: entry.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                })
                .collect();

            output::print_page(&rows, &result, format);
        }
    }

    Ok(())
}
