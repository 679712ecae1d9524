//! CLI command definitions and dispatch.

pub mod location;
pub mod migrate;
pub mod rate;
pub mod vehicle;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::debug;

use crate::output::OutputFormat;
use parkease_core::config::AppConfig;
use parkease_core::error::{AppError, ErrorKind};
use parkease_database::store::Stores;

/// ParkEase: parking slot occupancy and billing
#[derive(Debug, Parser)]
#[command(name = "parkease", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Database migration management
    Migrate(migrate::MigrateArgs),
    /// Parking location management
    Location(location::LocationArgs),
    /// Hourly rate management
    Rate(rate::RateArgs),
    /// Vehicle check-in, check-out and listings
    Vehicle(vehicle::VehicleArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self, config: &AppConfig) -> Result<(), AppError> {
        match &self.command {
            Commands::Migrate(args) => migrate::execute(args, config).await,
            Commands::Location(args) => location::execute(args, config, self.format).await,
            Commands::Rate(args) => rate::execute(args, config, self.format).await,
            Commands::Vehicle(args) => vehicle::execute(args, config, self.format).await,
        }
    }
}

/// Helper: open the configured storage backend
pub async fn open_stores(config: &AppConfig) -> Result<Stores, AppError> {
    debug!(backend = %config.storage.backend, "Opening storage backend");
    Stores::from_config(config).await
}

/// Process exit code for a failed command.
///
/// Transient failures use `EX_TEMPFAIL` so wrappers can retry; a broken
/// capacity invariant uses `EX_SOFTWARE`.
pub fn exit_code(err: &AppError) -> ExitCode {
    ExitCode::from(exit_status(err.kind))
}

fn exit_status(kind: ErrorKind) -> u8 {
    match kind {
        ErrorKind::Unavailable => 75,
        ErrorKind::ConsistencyViolation => 70,
        ErrorKind::Configuration => 78,
        _ => 1,
    }
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
    fn test_exit_status() {
        assert_eq!(exit_status(ErrorKind::CapacityExceeded), 1);
        assert_eq!(exit_status(ErrorKind::RecordNotFoundOrClosed), 1);
        assert_eq!(exit_status(ErrorKind::Unavailable), 75);
        assert_eq!(exit_status(ErrorKind::ConsistencyViolation), 70);
        assert_eq!(exit_status(ErrorKind::Configuration), 78);
    }

    #[test]
    fn test_parse_check_in() {
        let cli = Cli::try_parse_from([
            "parkease",
            "--format",
            "json",
            "vehicle",
            "check-in",
            "--location",
            "0196a1b2-0000-7000-8000-000000000001",
            "--employee",
            "0196a1b2-0000-7000-8000-000000000002",
            "--plate",
            "AB-123",
        ])
        .unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(matches!(cli.command, Commands::Vehicle(_)));
    }
}
