//! PostgreSQL occupancy store.

use async_trait::async_trait;
use futures::stream::BoxStream;
use sqlx::PgPool;
use tracing::{info, warn};

use parkease_core::error::AppError;
use parkease_core::result::AppResult;
use parkease_core::types::{LocationId, OccupancyRecordId};
use parkease_entity::location::{CreateLocation, Location, UpdateLocation};
use parkease_entity::occupancy::OccupancyRecord;

use super::begin_with_lock_timeout;
use super::transaction::PgLocationTransaction;
use crate::error::classify;
use crate::repositories::{LocationRepository, OccupancyRepository};
use crate::store::{
    CapacityStore, LocationTransaction, OccupancyLedger, OccupancyStore, UnitOfWork,
    clamp_recent_limit,
};

/// Occupancy store over a PostgreSQL pool.
#[derive(Debug, Clone)]
pub struct PgOccupancyStore {
    pool: PgPool,
    locations: LocationRepository,
    records: OccupancyRepository,
    lock_timeout_ms: u64,
}

impl PgOccupancyStore {
    /// Create a store on `pool` with the given row-lock timeout.
    pub fn new(pool: PgPool, lock_timeout_ms: u64) -> Self {
        Self {
            locations: LocationRepository::new(pool.clone()),
            records: OccupancyRepository::new(pool.clone()),
            pool,
            lock_timeout_ms,
        }
    }
}

#[async_trait]
impl CapacityStore for PgOccupancyStore {
    async fn find_location(&self, id: LocationId) -> AppResult<Option<Location>> {
        self.locations.find_by_id(id).await
    }

    async fn list_locations(&self) -> AppResult<Vec<Location>> {
        self.locations.find_all().await
    }

    async fn create_location(&self, req: &CreateLocation) -> AppResult<Location> {
        req.validate()?;
        let location = self.locations.create(req).await?;
        info!(location_id = %location.id, total_slots = location.total_slots, "Location created");
        Ok(location)
    }

    async fn update_location(&self, id: LocationId, req: &UpdateLocation) -> AppResult<Location> {
        req.validate()?;

        let mut tx = begin_with_lock_timeout(&self.pool, self.lock_timeout_ms).await?;
        let mut location = LocationRepository::lock_by_id(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::location_not_found(format!("Location {id} not found")))?;

        req.apply_to(&mut location, chrono::Utc::now());
        let location = LocationRepository::update_in(&mut tx, &location).await?;
        tx.commit()
            .await
            .map_err(|e| classify("Failed to commit location update", e))?;

        if !location.is_consistent() {
            warn!(
                location_id = %id,
                total_slots = location.total_slots,
                available_slots = location.available_slots,
                "Location edit left the available counter out of range"
            );
        }
        Ok(location)
    }

    async fn delete_location(&self, id: LocationId) -> AppResult<()> {
        let mut tx = begin_with_lock_timeout(&self.pool, self.lock_timeout_ms).await?;
        LocationRepository::lock_by_id(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::location_not_found(format!("Location {id} not found")))?;

        let open = OccupancyRepository::count_open_in(&mut tx, id).await?;
        if open > 0 {
            return Err(AppError::conflict(format!(
                "Cannot delete location {id} with {open} parked vehicles"
            )));
        }

        LocationRepository::delete_in(&mut tx, id).await?;
        tx.commit()
            .await
            .map_err(|e| classify("Failed to commit location delete", e))?;

        info!(location_id = %id, "Location deleted");
        Ok(())
    }
}

#[async_trait]
impl OccupancyLedger for PgOccupancyStore {
    async fn find_record(&self, id: OccupancyRecordId) -> AppResult<Option<OccupancyRecord>> {
        self.records.find_by_id(id).await
    }

    fn find_open_by_location(
        &self,
        location_id: LocationId,
    ) -> BoxStream<'_, AppResult<OccupancyRecord>> {
        self.records.stream_open(location_id)
    }

    async fn find_recent(
        &self,
        location_id: LocationId,
        limit: u32,
    ) -> AppResult<Vec<OccupancyRecord>> {
        if !self.locations.exists(location_id).await? {
            return Err(AppError::location_not_found(format!(
                "Location {location_id} not found"
            )));
        }
        self.records
            .find_recent(location_id, clamp_recent_limit(limit))
            .await
    }

    async fn count_open(&self, location_id: LocationId) -> AppResult<u64> {
        self.records.count_open(location_id).await
    }
}

#[async_trait]
impl UnitOfWork for PgOccupancyStore {
    async fn begin(&self, location_id: LocationId) -> AppResult<Box<dyn LocationTransaction>> {
        let mut tx = begin_with_lock_timeout(&self.pool, self.lock_timeout_ms).await?;
        let location = LocationRepository::lock_by_id(&mut tx, location_id)
            .await?
            .ok_or_else(|| {
                AppError::location_not_found(format!("Location {location_id} not found"))
            })?;

        Ok(Box::new(PgLocationTransaction::new(tx, location)))
    }
}

#[async_trait]
impl OccupancyStore for PgOccupancyStore {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn health_check(&self) -> AppResult<bool> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|one| one == 1)
            .map_err(|e| classify("Health check failed", e))
    }
}
