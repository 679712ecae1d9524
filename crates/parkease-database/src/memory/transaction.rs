//! Unit of work over one in-memory location.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::OwnedMutexGuard;
use tracing::debug;

use parkease_core::error::AppError;
use parkease_core::result::AppResult;
use parkease_core::types::OccupancyRecordId;
use parkease_entity::location::Location;
use parkease_entity::occupancy::{NewOccupancyRecord, OccupancyRecord};

use super::fault::FaultPoint;
use super::store::{LocationSlot, Shared};
use crate::store::{LocationTransaction, transaction_finished};

/// Holds a location's mutex for the lifetime of the unit of work.
///
/// Changes are staged on a working copy and written back on commit.
#[derive(Debug)]
pub struct MemoryLocationTransaction {
    guard: Option<OwnedMutexGuard<LocationSlot>>,
    shared: Arc<Shared>,
    location: Location,
    inserted: Vec<OccupancyRecord>,
    closed: HashMap<OccupancyRecordId, OccupancyRecord>,
}

impl MemoryLocationTransaction {
    pub(crate) fn new(guard: OwnedMutexGuard<LocationSlot>, shared: Arc<Shared>) -> Self {
        let location = guard.location.clone();
        Self {
            guard: Some(guard),
            shared,
            location,
            inserted: Vec::new(),
            closed: HashMap::new(),
        }
    }

    fn slot(&self) -> AppResult<&LocationSlot> {
        self.guard.as_deref().ok_or_else(transaction_finished)
    }

    /// Look up an open record as seen by this unit of work.
    fn staged_open_record(&self, id: OccupancyRecordId) -> AppResult<Option<OccupancyRecord>> {
        let slot = self.slot()?;
        if self.closed.contains_key(&id) {
            return Ok(None);
        }
        if let Some(record) = self.inserted.iter().find(|r| r.id == id) {
            return Ok(record.is_open().then(|| record.clone()));
        }
        Ok(slot
            .records
            .iter()
            .find(|r| r.id == id && r.is_open())
            .cloned())
    }
}

#[async_trait]
impl LocationTransaction for MemoryLocationTransaction {
    fn location(&self) -> &Location {
        &self.location
    }

    async fn adjust_available(&mut self, delta: i32) -> AppResult<i32> {
        self.slot()?;
        self.shared.faults.trip(FaultPoint::AdjustAvailable)?;

        let next = self.location.checked_available(delta)?;
        self.location.available_slots = next;
        self.location.updated_at = Utc::now();
        Ok(next)
    }

    async fn insert_record(&mut self, record: NewOccupancyRecord) -> AppResult<OccupancyRecord> {
        self.slot()?;
        self.shared.faults.trip(FaultPoint::InsertRecord)?;

        if record.location_id != self.location.id {
            return Err(AppError::internal(format!(
                "Record for location {} inserted through location {}",
                record.location_id, self.location.id
            )));
        }

        let record = OccupancyRecord::open(record);
        self.inserted.push(record.clone());
        Ok(record)
    }

    async fn find_open_record(
        &mut self,
        id: OccupancyRecordId,
    ) -> AppResult<Option<OccupancyRecord>> {
        self.staged_open_record(id)
    }

    async fn close_record(
        &mut self,
        id: OccupancyRecordId,
        exit_time: DateTime<Utc>,
        cost: Decimal,
    ) -> AppResult<OccupancyRecord> {
        self.slot()?;
        self.shared.faults.trip(FaultPoint::CloseRecord)?;

        let mut record = self.staged_open_record(id)?.ok_or_else(|| {
            AppError::record_not_found_or_closed(format!(
                "No open record {id} at location {}",
                self.location.id
            ))
        })?;
        record.close(exit_time, cost);

        match self.inserted.iter_mut().find(|r| r.id == id) {
            Some(staged) => *staged = record.clone(),
            None => {
                self.closed.insert(id, record.clone());
            }
        }
        Ok(record)
    }

    async fn commit(&mut self) -> AppResult<()> {
        let mut guard = self.guard.take().ok_or_else(transaction_finished)?;
        self.shared.faults.trip(FaultPoint::Commit)?;

        guard.location = self.location.clone();
        for record in guard.records.iter_mut() {
            if let Some(closed) = self.closed.remove(&record.id) {
                *record = closed;
            }
        }
        for record in self.inserted.drain(..) {
            self.shared.record_index.insert(record.id, record.location_id);
            guard.records.push(record);
        }

        debug!(
            location_id = %self.location.id,
            available_slots = self.location.available_slots,
            "Committed unit of work"
        );
        Ok(())
    }

    async fn rollback(&mut self) -> AppResult<()> {
        self.guard.take().ok_or_else(transaction_finished)?;
        self.inserted.clear();
        self.closed.clear();
        debug!(location_id = %self.location.id, "Rolled back unit of work");
        Ok(())
    }
}
