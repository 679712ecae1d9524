//! Vehicle check-in, check-out and ledger listing commands.

use std::sync::Arc;

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use parkease_core::clock::SystemClock;
use parkease_core::config::AppConfig;
use parkease_core::error::AppError;
use parkease_core::types::{EmployeeId, LocationId, OccupancyRecordId};
use parkease_entity::occupancy::OccupancyRecord;
use parkease_service::{CheckOutReceipt, LocationService, OccupancyEngine};

/// Arguments for vehicle commands
#[derive(Debug, Args)]
pub struct VehicleArgs {
    /// Vehicle subcommand
    #[command(subcommand)]
    pub command: VehicleCommand,
}

/// Vehicle subcommands
#[derive(Debug, Subcommand)]
pub enum VehicleCommand {
    /// Park a vehicle at a location
    CheckIn {
        /// Location ID
        #[arg(long)]
        location: LocationId,
        /// Employee performing the check-in
        #[arg(long)]
        employee: EmployeeId,
        /// License plate
        #[arg(long)]
        plate: String,
    },
    /// Release a parked vehicle and print its bill
    CheckOut {
        /// Location ID
        #[arg(long)]
        location: LocationId,
        /// Occupancy record ID returned at check-in
        #[arg(long)]
        record: OccupancyRecordId,
    },
    /// Most recent vehicles at a location
    Recent {
        /// Location ID
        #[arg(long)]
        location: LocationId,
        /// Maximum number of records (1-100)
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Vehicles currently parked at a location
    Parked {
        /// Location ID
        #[arg(long)]
        location: LocationId,
    },
}

/// Occupancy record display row for table output
#[derive(Debug, Serialize, Tabled)]
struct RecordRow {
    /// Record ID
    id: String,
    /// License plate
    plate: String,
    /// Entry time
    entry: String,
    /// Exit time
    exit: String,
    /// Cost
    cost: String,
    /// Status
    status: String,
}

impl From<&OccupancyRecord> for RecordRow {
    fn from(record: &OccupancyRecord) -> Self {
        Self {
            id: record.id.to_string(),
            plate: record.license_plate.clone(),
            entry: record.entry_time.format("%Y-%m-%d %H:%M").to_string(),
            exit: record
                .exit_time
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "-".to_string()),
            cost: record
                .cost
                .map(|c| c.to_string())
                .unwrap_or_else(|| "-".to_string()),
            status: record.status().to_string(),
        }
    }
}

/// Execute vehicle commands
pub async fn execute(
    args: &VehicleArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let stores = super::open_stores(config).await?;

    match &args.command {
        VehicleCommand::CheckIn {
            location,
            employee,
            plate,
        } => {
            let engine = OccupancyEngine::from_stores(&stores, Arc::new(SystemClock));
            let record = engine.check_in(*location, *employee, plate).await?;
            match format {
                OutputFormat::Json => output::print_json(&record),
                OutputFormat::Table => {
                    output::print_success(&format!("Vehicle '{}' checked in", record.license_plate));
                    output::print_kv("Record", &record.id.to_string());
                    output::print_kv(
                        "Entry",
                        &record.entry_time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
                    );
                }
            }
        }
        VehicleCommand::CheckOut { location, record } => {
            let engine = OccupancyEngine::from_stores(&stores, Arc::new(SystemClock));
            let receipt = engine.check_out(*record, *location).await?;
            print_receipt(&receipt, format);
        }
        VehicleCommand::Recent { location, limit } => {
            let service = LocationService::new(stores.occupancy.clone(), config.billing.recent_limit);
            let records = service.recent(*location, *limit).await?;
            print_records(&records, format);
        }
        VehicleCommand::Parked { location } => {
            let service = LocationService::new(stores.occupancy.clone(), config.billing.recent_limit);
            let records = service.parked(*location).await?;
            print_records(&records, format);
        }
    }

    Ok(())
}

fn print_records(records: &[OccupancyRecord], format: OutputFormat) {
    match format {
        OutputFormat::Json => output::print_json(records),
        OutputFormat::Table => {
            let rows: Vec<RecordRow> = records.iter().map(RecordRow::from).collect();
            output::print_list(&rows, format);
        }
    }
}

fn print_receipt(receipt: &CheckOutReceipt, format: OutputFormat) {
    match format {
        OutputFormat::Json => output::print_json(receipt),
        OutputFormat::Table => {
            output::print_success(&format!("Vehicle '{}' checked out", receipt.license_plate));
            output::print_kv("Record", &receipt.record_id.to_string());
            output::print_kv(
                "Entry",
                &receipt.entry_time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            );
            output::print_kv(
                "Exit",
                &receipt.exit_time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            );
            output::print_kv("Hours", &receipt.billed_hours.to_string());
            output::print_kv("Hourly rate", &receipt.hourly_rate.to_string());
            output::print_kv("Cost", &receipt.cost.to_string());
        }
    }
}
