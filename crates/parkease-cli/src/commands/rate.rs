//! Hourly rate CLI commands.

use clap::{Args, Subcommand};
use rust_decimal::Decimal;

use crate::output::{self, OutputFormat};
use parkease_core::config::AppConfig;
use parkease_core::error::AppError;
use parkease_entity::rate::RateSetting;
use parkease_service::RateService;

/// Arguments for rate commands
#[derive(Debug, Args)]
pub struct RateArgs {
    /// Rate subcommand
    #[command(subcommand)]
    pub command: RateCommand,
}

/// Rate subcommands
#[derive(Debug, Subcommand)]
pub enum RateCommand {
    /// Show the current hourly rate
    Show,
    /// Replace the hourly rate
    Set {
        /// New rate per hour, e.g. 3.50
        rate: Decimal,
    },
}

/// Execute rate commands
pub async fn execute(
    args: &RateArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let stores = super::open_stores(config).await?;
    let service = RateService::new(stores.rates.clone());

    match &args.command {
        RateCommand::Show => {
            let setting = service.current().await?;
            print_setting(&setting, format);
        }
        RateCommand::Set { rate } => {
            let setting = service.set(*rate).await?;
            match format {
                OutputFormat::Json => output::print_json(&setting),
                OutputFormat::Table => output::print_success(&format!(
                    "Hourly rate set to {}",
                    setting.hourly_rate
                )),
            }
        }
    }

    Ok(())
}

fn print_setting(setting: &RateSetting, format: OutputFormat) {
    match format {
        OutputFormat::Json => output::print_json(setting),
        OutputFormat::Table => {
            output::print_kv("Hourly rate", &setting.hourly_rate.to_string());
            output::print_kv(
                "Updated",
                &setting.updated_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            );
        }
    }
}
