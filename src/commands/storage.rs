//! Storage backend CLI commands.

use clap::{Args, Subcommand};

use cirrus_core::AppResult;

use crate::commands::App;
use crate::output::{self, OutputFormat};

/// Arguments for storage commands
#[derive(Debug, Args)]
pub struct StorageArgs {
    /// Storage subcommand
    #[command(subcommand)]
    pub command: StorageCommand,
}

/// Storage subcommands
#[derive(Debug, Subcommand)]
pub enum StorageCommand {
    /// Show the active storage backend
    Info,
    /// Probe database and storage health
    Health,
}

/// Execute storage commands
pub async fn execute(args: &StorageArgs, app: &App, _format: OutputFormat) -> AppResult<()> {
    match &args.command {
        StorageCommand::Info => {
            println!("Storage backend");
            output::print_kv("Driver", app.storage.driver_name());
            output::print_kv("Bucket", app.storage.bucket_name().unwrap_or("-"));
        }
        StorageCommand::Health => {
            match app.db.health_check().await {
                Ok(true) => output::print_success("Database reachable"),
                Ok(false) => output::print_error("Database returned an unexpected answer"),
                Err(e) => output::print_error(&format!("Database unreachable: {}", e)),
            }

            match app.storage.health_check().await {
                Ok(true) => output::print_success(&format!(
                    "Storage backend '{}' reachable",
                    app.storage.driver_name()
                )),
                Ok(false) => output::print_error(&format!(
                    "Storage backend '{}' failed its probe",
                    app.storage.driver_name()
                )),
                Err(e) => output::print_error(&format!("Storage backend unreachable: {}", e)),
            }
        }
    }

    Ok(())
}
