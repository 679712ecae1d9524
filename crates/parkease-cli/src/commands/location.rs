//! Parking location CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use parkease_core::config::AppConfig;
use parkease_core::error::AppError;
use parkease_core::types::LocationId;
use parkease_entity::location::{CreateLocation, Location, UpdateLocation};
use parkease_service::{LocationAvailability, LocationService};

/// Arguments for location commands
#[derive(Debug, Args)]
pub struct LocationArgs {
    /// Location subcommand
    #[command(subcommand)]
    pub command: LocationCommand,
}

/// Location subcommands
#[derive(Debug, Subcommand)]
pub enum LocationCommand {
    /// List all locations with their availability
    List,
    /// Show one location
    Show {
        /// Location ID
        id: LocationId,
    },
    /// Create a location with every slot free
    Create {
        /// Display name
        #[arg(long)]
        name: String,
        /// Latitude in decimal degrees
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        /// Longitude in decimal degrees
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,
        /// Total number of slots
        #[arg(long)]
        slots: i32,
    },
    /// Edit a location; omitted fields keep their value
    Edit {
        /// Location ID
        id: LocationId,
        /// New display name
        #[arg(long)]
        name: Option<String>,
        /// New latitude
        #[arg(long, allow_negative_numbers = true)]
        lat: Option<f64>,
        /// New longitude
        #[arg(long, allow_negative_numbers = true)]
        lon: Option<f64>,
        /// New total number of slots
        #[arg(long)]
        slots: Option<i32>,
    },
    /// Delete a location with no parked vehicles
    Delete {
        /// Location ID
        id: LocationId,
        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },
}

/// Location display row for table output
#[derive(Debug, Serialize, Tabled)]
struct LocationRow {
    /// Location ID
    id: String,
    /// Name
    name: String,
    /// Total slots
    total: i32,
    /// Available slots
    available: i32,
    /// Occupancy percentage
    occupancy: String,
}

impl From<&LocationAvailability> for LocationRow {
    fn from(view: &LocationAvailability) -> Self {
        Self {
            id: view.location_id.to_string(),
            name: view.name.clone(),
            total: view.total_slots,
            available: view.available_slots,
            occupancy: format!("{}%", view.occupancy_percent),
        }
    }
}

/// Execute location commands
pub async fn execute(
    args: &LocationArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let stores = super::open_stores(config).await?;
    let service = LocationService::new(stores.occupancy.clone(), config.billing.recent_limit);

    match &args.command {
        LocationCommand::List => {
            let views = service.availability().await?;
            match format {
                OutputFormat::Json => output::print_json(&views),
                OutputFormat::Table => {
                    let rows: Vec<LocationRow> = views.iter().map(LocationRow::from).collect();
                    output::print_list(&rows, format);
                }
            }
        }
        LocationCommand::Show { id } => {
            let location = service.get(*id).await?;
            print_location(&location, format);
        }
        LocationCommand::Create {
            name,
            lat,
            lon,
            slots,
        } => {
            let location = service
                .create(CreateLocation {
                    name: name.clone(),
                    latitude: *lat,
                    longitude: *lon,
                    total_slots: *slots,
                })
                .await?;
            match format {
                OutputFormat::Json => output::print_json(&location),
                OutputFormat::Table => output::print_success(&format!(
                    "Location '{}' created with ID {}",
                    location.name, location.id
                )),
            }
        }
        LocationCommand::Edit {
            id,
            name,
            lat,
            lon,
            slots,
        } => {
            let current = service.get(*id).await?;
            let location = service
                .update(
                    *id,
                    UpdateLocation {
                        name: name.clone().unwrap_or(current.name),
                        latitude: lat.unwrap_or(current.latitude),
                        longitude: lon.unwrap_or(current.longitude),
                        total_slots: slots.unwrap_or(current.total_slots),
                    },
                )
                .await?;

            if !location.is_consistent() {
                output::print_warning(&format!(
                    "Location now reports {} available of {} total slots; check-ins are refused until vehicles leave.",
                    location.available_slots, location.total_slots
                ));
            }
            print_location(&location, format);
        }
        LocationCommand::Delete { id, force } => {
            let location = service.get(*id).await?;
            if !force {
                let confirm = dialoguer::Confirm::new()
                    .with_prompt(format!("Delete location '{}'?", location.name))
                    .default(false)
                    .interact()
                    .map_err(|e| AppError::internal(format!("Input error: {e}")))?;

                if !confirm {
                    println!("Cancelled.");
                    return Ok(());
                }
            }

            service.delete(*id).await?;
            output::print_success(&format!("Location '{}' deleted", location.name));
        }
    }

    Ok(())
}

fn print_location(location: &Location, format: OutputFormat) {
    match format {
        OutputFormat::Json => output::print_json(location),
        OutputFormat::Table => {
            output::print_kv("ID", &location.id.to_string());
            output::print_kv("Name", &location.name);
            output::print_kv(
                "Coordinates",
                &format!("{:.6}, {:.6}", location.latitude, location.longitude),
            );
            output::print_kv("Total slots", &location.total_slots.to_string());
            output::print_kv("Available slots", &location.available_slots.to_string());
            output::print_kv("Occupancy", &format!("{}%", location.occupancy_percent()));
            output::print_kv(
                "Updated",
                &location.updated_at.format("%Y-%m-%d %H:%M").to_string(),
            );
        }
    }
}
