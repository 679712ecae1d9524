//! In-memory occupancy store.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use futures::StreamExt;
use futures::stream::{self, BoxStream};
use tokio::sync::Mutex;
use tracing::{info, warn};

use parkease_core::error::AppError;
use parkease_core::result::AppResult;
use parkease_core::types::{LocationId, OccupancyRecordId};
use parkease_entity::location::{CreateLocation, Location, UpdateLocation};
use parkease_entity::occupancy::OccupancyRecord;

use super::fault::{FaultInjector, FaultPoint};
use super::transaction::MemoryLocationTransaction;
use crate::store::{
    CapacityStore, LocationTransaction, OccupancyLedger, OccupancyStore, UnitOfWork,
    clamp_recent_limit,
};

/// Everything guarded by one location's mutex.
#[derive(Debug)]
pub(crate) struct LocationSlot {
    /// The location row.
    pub(crate) location: Location,
    /// The location's records in insertion order.
    pub(crate) records: Vec<OccupancyRecord>,
    /// Set when the location is deleted while a waiter holds its `Arc`.
    pub(crate) deleted: bool,
}

/// State shared between the store and its open transactions.
#[derive(Debug, Default)]
pub(crate) struct Shared {
    /// Per-location state.
    pub(crate) locations: DashMap<LocationId, Arc<Mutex<LocationSlot>>>,
    /// Record ID to owning location, for lookups by record.
    pub(crate) record_index: DashMap<OccupancyRecordId, LocationId>,
    /// Armed faults.
    pub(crate) faults: FaultInjector,
}

/// In-memory occupancy store using one Tokio mutex per location.
///
/// Suitable for single-node deployments only.
#[derive(Debug, Clone, Default)]
pub struct MemoryOccupancyStore {
    shared: Arc<Shared>,
}

impl MemoryOccupancyStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fault points for exercising rollback paths.
    pub fn faults(&self) -> &FaultInjector {
        &self.shared.faults
    }

    /// Insert a location row as-is, bypassing validation.
    ///
    /// Lets callers reproduce externally tampered counters.
    pub fn insert_raw_location(&self, location: Location) {
        let slot = LocationSlot {
            location,
            records: Vec::new(),
            deleted: false,
        };
        self.shared
            .locations
            .insert(slot.location.id, Arc::new(Mutex::new(slot)));
    }

    fn slot(&self, id: LocationId) -> Option<Arc<Mutex<LocationSlot>>> {
        self.shared
            .locations
            .get(&id)
            .map(|entry| Arc::clone(entry.value()))
    }
}

#[async_trait]
impl CapacityStore for MemoryOccupancyStore {
    async fn find_location(&self, id: LocationId) -> AppResult<Option<Location>> {
        let Some(slot) = self.slot(id) else {
            return Ok(None);
        };
        let slot = slot.lock().await;
        Ok((!slot.deleted).then(|| slot.location.clone()))
    }

    async fn list_locations(&self) -> AppResult<Vec<Location>> {
        let slots: Vec<_> = self
            .shared
            .locations
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        let mut locations = Vec::with_capacity(slots.len());
        for slot in slots {
            let slot = slot.lock().await;
            if !slot.deleted {
                locations.push(slot.location.clone());
            }
        }
        locations.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(locations)
    }

    async fn create_location(&self, req: &CreateLocation) -> AppResult<Location> {
        req.validate()?;

        let now = Utc::now();
        let location = Location {
            id: LocationId::new(),
            name: req.name.trim().to_string(),
            latitude: req.latitude,
            longitude: req.longitude,
            total_slots: req.total_slots,
            available_slots: req.total_slots,
            created_at: now,
            updated_at: now,
        };
        self.insert_raw_location(location.clone());

        info!(location_id = %location.id, total_slots = location.total_slots, "Location created");
        Ok(location)
    }

    async fn update_location(&self, id: LocationId, req: &UpdateLocation) -> AppResult<Location> {
        req.validate()?;

        let slot = self
            .slot(id)
            .ok_or_else(|| AppError::location_not_found(format!("Location {id} not found")))?;
        let mut slot = slot.lock().await;
        if slot.deleted {
            return Err(AppError::location_not_found(format!("Location {id} not found")));
        }

        req.apply_to(&mut slot.location, Utc::now());
        if !slot.location.is_consistent() {
            warn!(
                location_id = %id,
                total_slots = slot.location.total_slots,
                available_slots = slot.location.available_slots,
                "Location edit left the available counter out of range"
            );
        }
        Ok(slot.location.clone())
    }

    async fn delete_location(&self, id: LocationId) -> AppResult<()> {
        let slot = self
            .slot(id)
            .ok_or_else(|| AppError::location_not_found(format!("Location {id} not found")))?;
        let mut slot = slot.lock().await;
        if slot.deleted {
            return Err(AppError::location_not_found(format!("Location {id} not found")));
        }

        let open = slot.records.iter().filter(|r| r.is_open()).count();
        if open > 0 {
            return Err(AppError::conflict(format!(
                "Cannot delete location {id} with {open} parked vehicles"
            )));
        }

        slot.deleted = true;
        for record in &slot.records {
            self.shared.record_index.remove(&record.id);
        }
        self.shared.locations.remove(&id);
        info!(location_id = %id, "Location deleted");
        Ok(())
    }
}

#[async_trait]
impl OccupancyLedger for MemoryOccupancyStore {
    async fn find_record(&self, id: OccupancyRecordId) -> AppResult<Option<OccupancyRecord>> {
        let Some(location_id) = self.shared.record_index.get(&id).map(|entry| *entry.value())
        else {
            return Ok(None);
        };
        let Some(slot) = self.slot(location_id) else {
            return Ok(None);
        };
        let slot = slot.lock().await;
        Ok(slot.records.iter().find(|r| r.id == id).cloned())
    }

    fn find_open_by_location(
        &self,
        location_id: LocationId,
    ) -> BoxStream<'_, AppResult<OccupancyRecord>> {
        let slot = self.slot(location_id);
        stream::once(async move {
            let open: Vec<OccupancyRecord> = match slot {
                Some(slot) => {
                    let slot = slot.lock().await;
                    slot.records.iter().filter(|r| r.is_open()).cloned().collect()
                }
                None => Vec::new(),
            };
            stream::iter(open.into_iter().map(Ok))
        })
        .flatten()
        .boxed()
    }

    async fn find_recent(
        &self,
        location_id: LocationId,
        limit: u32,
    ) -> AppResult<Vec<OccupancyRecord>> {
        let slot = self.slot(location_id).ok_or_else(|| {
            AppError::location_not_found(format!("Location {location_id} not found"))
        })?;
        let slot = slot.lock().await;
        if slot.deleted {
            return Err(AppError::location_not_found(format!(
                "Location {location_id} not found"
            )));
        }

        let mut records = slot.records.clone();
        records.sort_by(|a, b| b.entry_time.cmp(&a.entry_time));
        records.truncate(clamp_recent_limit(limit) as usize);
        Ok(records)
    }

    async fn count_open(&self, location_id: LocationId) -> AppResult<u64> {
        let Some(slot) = self.slot(location_id) else {
            return Ok(0);
        };
        let slot = slot.lock().await;
        Ok(slot.records.iter().filter(|r| r.is_open()).count() as u64)
    }
}

#[async_trait]
impl UnitOfWork for MemoryOccupancyStore {
    async fn begin(&self, location_id: LocationId) -> AppResult<Box<dyn LocationTransaction>> {
        self.shared.faults.trip(FaultPoint::Begin)?;

        let slot = self.slot(location_id).ok_or_else(|| {
            AppError::location_not_found(format!("Location {location_id} not found"))
        })?;
        let guard = slot.lock_owned().await;
        if guard.deleted {
            return Err(AppError::location_not_found(format!(
                "Location {location_id} not found"
            )));
        }

        Ok(Box::new(MemoryLocationTransaction::new(
            guard,
            Arc::clone(&self.shared),
        )))
    }
}

#[async_trait]
impl OccupancyStore for MemoryOccupancyStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use futures::TryStreamExt;
    use parkease_core::error::ErrorKind;
    use parkease_core::types::EmployeeId;
    use parkease_entity::occupancy::NewOccupancyRecord;
    use rust_decimal_macros::dec;

    fn create_req(name: &str, slots: i32) -> CreateLocation {
        CreateLocation {
            name: name.to_string(),
            latitude: 40.7128,
            longitude: -74.0060,
            total_slots: slots,
        }
    }

    fn new_record(location_id: LocationId, plate: &str) -> NewOccupancyRecord {
        NewOccupancyRecord {
            location_id,
            employee_id: EmployeeId::new(),
            license_plate: plate.to_string(),
            entry_time: Utc::now(),
        }
    }

    async fn park(store: &MemoryOccupancyStore, location_id: LocationId, plate: &str) -> OccupancyRecord {
        let mut tx = store.begin(location_id).await.unwrap();
        tx.adjust_available(-1).await.unwrap();
        let record = tx.insert_record(new_record(location_id, plate)).await.unwrap();
        tx.commit().await.unwrap();
        record
    }

    #[tokio::test]
    async fn test_create_starts_fully_available() {
        let store = MemoryOccupancyStore::new();
        let loc = store.create_location(&create_req("Downtown", 100)).await.unwrap();
        assert_eq!(store.get_available(loc.id).await.unwrap(), 100);
    }

    #[tokio::test]
    async fn test_get_available_unknown_location() {
        let store = MemoryOccupancyStore::new();
        let err = store.get_available(LocationId::new()).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::LocationNotFound);
    }

    #[tokio::test]
    async fn test_commit_publishes_staged_changes() {
        let store = MemoryOccupancyStore::new();
        let loc = store.create_location(&create_req("Downtown", 3)).await.unwrap();

        let record = park(&store, loc.id, "ABC-123").await;

        assert_eq!(store.get_available(loc.id).await.unwrap(), 2);
        assert_eq!(store.count_open(loc.id).await.unwrap(), 1);
        assert_eq!(store.find_record(record.id).await.unwrap(), Some(record));
    }

    #[tokio::test]
    async fn test_drop_without_commit_discards_changes() {
        let store = MemoryOccupancyStore::new();
        let loc = store.create_location(&create_req("Downtown", 3)).await.unwrap();

        {
            let mut tx = store.begin(loc.id).await.unwrap();
            tx.adjust_available(-1).await.unwrap();
            tx.insert_record(new_record(loc.id, "ABC-123")).await.unwrap();
            assert_eq!(tx.location().available_slots, 2);
        }

        assert_eq!(store.get_available(loc.id).await.unwrap(), 3);
        assert_eq!(store.count_open(loc.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_adjust_rejects_leaving_range() {
        let store = MemoryOccupancyStore::new();
        let loc = store.create_location(&create_req("Tiny", 1)).await.unwrap();

        let mut tx = store.begin(loc.id).await.unwrap();
        let err = tx.adjust_available(1).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::ConsistencyViolation);
        tx.rollback().await.unwrap();

        assert_eq!(store.get_available(loc.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_close_twice_fails() {
        let store = MemoryOccupancyStore::new();
        let loc = store.create_location(&create_req("Downtown", 3)).await.unwrap();
        let record = park(&store, loc.id, "XYZ-9").await;

        let mut tx = store.begin(loc.id).await.unwrap();
        let exit = record.entry_time + Duration::hours(1);
        tx.close_record(record.id, exit, dec!(2.50)).await.unwrap();
        let err = tx.close_record(record.id, exit, dec!(2.50)).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::RecordNotFoundOrClosed);
    }

    #[tokio::test]
    async fn test_find_open_record_is_scoped_to_location() {
        let store = MemoryOccupancyStore::new();
        let a = store.create_location(&create_req("A", 3)).await.unwrap();
        let b = store.create_location(&create_req("B", 3)).await.unwrap();
        let record = park(&store, a.id, "AAA-1").await;

        let mut tx = store.begin(b.id).await.unwrap();
        assert!(tx.find_open_record(record.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_open_stream_and_recent_ordering() {
        let store = MemoryOccupancyStore::new();
        let loc = store.create_location(&create_req("Downtown", 10)).await.unwrap();
        let first = park(&store, loc.id, "ONE").await;
        let second = park(&store, loc.id, "TWO").await;

        let open: Vec<_> = store
            .find_open_by_location(loc.id)
            .try_collect()
            .await
            .unwrap();
        assert_eq!(open.len(), 2);
        assert_eq!(open[0].id, first.id);

        let recent = store.find_recent(loc.id, 1).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].id, second.id);
    }

    #[tokio::test]
    async fn test_open_stream_unknown_location_is_empty() {
        let store = MemoryOccupancyStore::new();
        let open: Vec<_> = store
            .find_open_by_location(LocationId::new())
            .try_collect()
            .await
            .unwrap();
        assert!(open.is_empty());
    }

    #[tokio::test]
    async fn test_update_shifts_available() {
        let store = MemoryOccupancyStore::new();
        let loc = store.create_location(&create_req("Downtown", 10)).await.unwrap();
        park(&store, loc.id, "ONE").await;

        let updated = store
            .update_location(
                loc.id,
                &UpdateLocation {
                    name: "Downtown".to_string(),
                    latitude: loc.latitude,
                    longitude: loc.longitude,
                    total_slots: 20,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.total_slots, 20);
        assert_eq!(updated.available_slots, 19);
    }

    #[tokio::test]
    async fn test_delete_refused_with_parked_vehicles() {
        let store = MemoryOccupancyStore::new();
        let loc = store.create_location(&create_req("Downtown", 10)).await.unwrap();
        park(&store, loc.id, "ONE").await;

        let err = store.delete_location(loc.id).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_delete_then_begin_fails() {
        let store = MemoryOccupancyStore::new();
        let loc = store.create_location(&create_req("Empty", 10)).await.unwrap();
        store.delete_location(loc.id).await.unwrap();

        let err = store.begin(loc.id).await.err().unwrap();
        assert_eq!(err.kind, ErrorKind::LocationNotFound);
        assert!(store.find_location(loc.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_drops_closed_records_from_index() {
        let store = MemoryOccupancyStore::new();
        let loc = store.create_location(&create_req("Old Lot", 2)).await.unwrap();
        let other = store.create_location(&create_req("New Lot", 2)).await.unwrap();
        let record = park(&store, loc.id, "GONE-1").await;
        let kept = park(&store, other.id, "KEEP-1").await;

        let mut tx = store.begin(loc.id).await.unwrap();
        tx.close_record(record.id, record.entry_time + Duration::hours(1), dec!(2.50))
            .await
            .unwrap();
        tx.adjust_available(1).await.unwrap();
        tx.commit().await.unwrap();

        store.delete_location(loc.id).await.unwrap();

        assert!(!store.shared.record_index.contains_key(&record.id));
        assert!(store.find_record(record.id).await.unwrap().is_none());
        assert_eq!(store.find_record(kept.id).await.unwrap(), Some(kept));
    }

    #[tokio::test]
    async fn test_injected_commit_fault_leaves_state_untouched() {
        let store = MemoryOccupancyStore::new();
        let loc = store.create_location(&create_req("Downtown", 3)).await.unwrap();
        store.faults().arm(FaultPoint::Commit);

        let mut tx = store.begin(loc.id).await.unwrap();
        tx.adjust_available(-1).await.unwrap();
        tx.insert_record(new_record(loc.id, "ABC-123")).await.unwrap();
        let err = tx.commit().await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unavailable);
        drop(tx);

        assert_eq!(store.get_available(loc.id).await.unwrap(), 3);
        assert_eq!(store.count_open(loc.id).await.unwrap(), 0);
    }
}
