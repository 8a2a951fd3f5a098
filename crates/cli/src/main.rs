//! ShopX CLI - database migrations and operator tools.
//!
//! # Usage
//!
//! ```bash
//! # Apply database migrations
//! shopx migrate
//!
//! # Create the first admin account (password from SHOPX_ADMIN_PASSWORD or --password)
//! shopx admin create -e admin@example.com -n "Admin Name"
//!
//! # Run a maintenance job once
//! shopx jobs expire-discounts
//! shopx jobs complete-orders
//! shopx jobs send-scheduled
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

use shopx_server::jobs::Job;

mod commands;

#[derive(Parser)]
#[command(name = "shopx")]
#[command(author, version, about = "ShopX CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage admin users
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Run a maintenance job once
    Jobs {
        #[command(subcommand)]
        job: JobCommand,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new admin user
    Create {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// Admin display name
        #[arg(short, long)]
        name: String,

        /// Initial password
        #[arg(short, long, env = "SHOPX_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

#[derive(Subcommand, Clone, Copy)]
enum JobCommand {
    /// Deactivate discount codes past their end date
    ExpireDiscounts,
    /// Complete delivered orders whose refund window has closed
    CompleteOrders,
    /// Send scheduled notifications that are due
    SendScheduled,
}

impl From<JobCommand> for Job {
    fn from(command: JobCommand) -> Self {
        match command {
            JobCommand::ExpireDiscounts => Self::ExpireDiscounts,
            JobCommand::CompleteOrders => Self::CompleteOrders,
            JobCommand::SendScheduled => Self::SendScheduled,
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Admin { action } => match action {
            AdminAction::Create {
                email,
                name,
                password,
            } => {
                commands::admin::create_user(&email, &name, &password).await?;
            }
        },
        Commands::Jobs { job } => {
            commands::jobs::run(job.into()).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_job_subcommands_parse() {
        let cli = Cli::try_parse_from(["shopx", "jobs", "complete-orders"]).unwrap_or_else(|e| panic!("{e}"));
        match cli.command {
            Commands::Jobs { job } => assert_eq!(Job::from(job), Job::CompleteOrders),
            _ => panic!("expected jobs subcommand"),
        }
    }

    #[test]
    fn test_admin_create_parses() {
        let cli = Cli::try_parse_from([
            "shopx", "admin", "create", "-e", "a@b.co", "-n", "Ada", "-p", "long enough",
        ])
        .unwrap_or_else(|e| panic!("{e}"));
        assert!(matches!(
            cli.command,
            Commands::Admin {
                action: AdminAction::Create { .. }
            }
        ));
    }
}
