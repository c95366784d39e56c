//! User management CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;
use uuid::Uuid;

use cirrus_core::AppResult;
use cirrus_entity::NewUser;

use crate::commands::App;
use crate::output::{self, OutputFormat};

/// Arguments for user commands
#[derive(Debug, Args)]
pub struct UserArgs {
    /// User subcommand
    #[command(subcommand)]
    pub command: UserCommand,
}

/// User subcommands
#[derive(Debug, Subcommand)]
pub enum UserCommand {
    /// Register a user
    Add {
        /// Email address
        email: String,
        /// Display name (defaults to the email address)
        #[arg(short, long)]
        name: Option<String>,
    },
    /// List all users
    List,
}

/// User display row
#[derive(Debug, Serialize, Tabled)]
struct UserRow {
    /// User UUID
    uuid: String,
    /// Email
    email: String,
    /// Display name
    name: String,
    /// Created at
    created_at: String,
}

/// Execute user commands
pub async fn execute(args: &UserArgs, app: &App, format: OutputFormat) -> AppResult<()> {
    match &args.command {
        UserCommand::Add { email, name } => {
            let user = app
                .users
                .create(&NewUser {
                    uuid: Uuid::new_v4(),
                    email: email.clone(),
                    display_name: name.clone().unwrap_or_else(|| email.clone()),
                })
                .await?;

            output::print_success(&format!(
                "User '{}' registered (uuid: {})",
                user.email, user.uuid
            ));
        }
        UserCommand::List => {
            let users = app.users.list().await?;

            let rows: Vec<UserRow> = users
                .iter()
                .map(|u| UserRow {
                    uuid: u.uuid.to_string(),
                    email: u.email.clone(),
                    name: u.display_name.clone(),
                    created_at: u.created_at.format("%Y-%m-%d %H:%M").to_string(),
                })
                .collect();

            output::print_list(&rows, format);
        }
    }

    Ok(())
}
