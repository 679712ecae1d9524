//! Database migration management commands.

use clap::{Args, Subcommand};

use crate::output;
use parkease_core::config::{AppConfig, StorageBackend};
use parkease_core::error::AppError;
use parkease_database::DatabasePool;

/// Arguments for the migrate command
#[derive(Debug, Args)]
pub struct MigrateArgs {
    /// Migration subcommand
    #[command(subcommand)]
    pub command: MigrateCommand,
}

/// Migration subcommands
#[derive(Debug, Subcommand)]
pub enum MigrateCommand {
    /// Run all pending migrations
    Run,
}

/// Execute migration commands
pub async fn execute(args: &MigrateArgs, config: &AppConfig) -> Result<(), AppError> {
    match &args.command {
        MigrateCommand::Run => {
            if config.storage.backend != StorageBackend::Postgres {
                output::print_warning(&format!(
                    "Storage backend is '{}'; nothing to migrate.",
                    config.storage.backend
                ));
                return Ok(());
            }

            let pool = DatabasePool::connect(&config.database).await?;
            println!("Running database migrations...");
            parkease_database::migration::run_migrations(pool.pool()).await?;
            pool.close().await;
            output::print_success("All migrations applied successfully.");
        }
    }

    Ok(())
}
