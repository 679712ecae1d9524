//! Location administration and availability views.

use std::sync::Arc;

use futures::TryStreamExt;
use serde::{Deserialize, Serialize};
use tracing::info;

use parkease_core::error::AppError;
use parkease_core::result::AppResult;
use parkease_core::types::LocationId;
use parkease_database::store::OccupancyStore;
use parkease_entity::location::{CreateLocation, Location, UpdateLocation};
use parkease_entity::occupancy::OccupancyRecord;

/// Public availability of one location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationAvailability {
    /// Location ID.
    pub location_id: LocationId,
    /// Display name.
    pub name: String,
    /// Total number of slots.
    pub total_slots: i32,
    /// Free slots.
    pub available_slots: i32,
    /// Occupied slots.
    pub occupied_slots: i32,
    /// Occupancy as a whole percentage.
    pub occupancy_percent: u8,
}

impl From<&Location> for LocationAvailability {
    fn from(location: &Location) -> Self {
        Self {
            location_id: location.id,
            name: location.name.clone(),
            total_slots: location.total_slots,
            available_slots: location.available_slots,
            occupied_slots: location.occupied_slots(),
            occupancy_percent: location.occupancy_percent(),
        }
    }
}

/// CRUD over locations plus the read-only ledger views.
#[derive(Debug, Clone)]
pub struct LocationService {
    /// Occupancy store.
    store: Arc<dyn OccupancyStore>,
    /// Default size of "recent vehicles" listings.
    recent_limit: u32,
}

impl LocationService {
    /// Creates a new location service.
    pub fn new(store: Arc<dyn OccupancyStore>, recent_limit: u32) -> Self {
        Self {
            store,
            recent_limit,
        }
    }

    /// Lists all locations ordered by name.
    pub async fn list(&self) -> AppResult<Vec<Location>> {
        self.store.list_locations().await
    }

    /// Gets a location by ID.
    pub async fn get(&self, id: LocationId) -> AppResult<Location> {
        self.store
            .find_location(id)
            .await?
            .ok_or_else(|| AppError::location_not_found(format!("Location {id} not found")))
    }

    /// Availability of every location.
    pub async fn availability(&self) -> AppResult<Vec<LocationAvailability>> {
        Ok(self
            .list()
            .await?
            .iter()
            .map(LocationAvailability::from)
            .collect())
    }

    /// Availability of one location.
    pub async fn availability_of(&self, id: LocationId) -> AppResult<LocationAvailability> {
        Ok(LocationAvailability::from(&self.get(id).await?))
    }

    /// Creates a new location with every slot free.
    pub async fn create(&self, req: CreateLocation) -> AppResult<Location> {
        self.store.create_location(&req).await
    }

    /// Edits a location.
    pub async fn update(&self, id: LocationId, req: UpdateLocation) -> AppResult<Location> {
        let location = self.store.update_location(id, &req).await?;
        info!(location_id = %id, total_slots = location.total_slots, "Location updated");
        Ok(location)
    }

    /// Deletes a location with no parked vehicles.
    pub async fn delete(&self, id: LocationId) -> AppResult<()> {
        self.store.delete_location(id).await
    }

    /// Vehicles currently parked at a location, in entry order.
    pub async fn parked(&self, id: LocationId) -> AppResult<Vec<OccupancyRecord>> {
        self.get(id).await?;
        self.store.find_open_by_location(id).try_collect().await
    }

    /// Most recent records at a location. `None` uses the configured default.
    pub async fn recent(&self, id: LocationId, limit: Option<u32>) -> AppResult<Vec<OccupancyRecord>> {
        self.store
            .find_recent(id, limit.unwrap_or(self.recent_limit))
            .await
    }
}
