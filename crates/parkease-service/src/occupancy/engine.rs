//! Occupancy engine: the check-in and check-out transactions.

use std::sync::Arc;

use chrono::{DateTime, SubsecRound, Utc};
use tracing::{error, info, warn};

use parkease_core::clock::Clock;
use parkease_core::error::{AppError, ErrorKind};
use parkease_core::result::AppResult;
use parkease_core::types::{EmployeeId, LocationId, OccupancyRecordId};
use parkease_database::store::{LocationTransaction, OccupancyStore, RateProvider, Stores};
use parkease_entity::occupancy::{NewOccupancyRecord, OccupancyRecord};

use super::billing::Bill;
use super::receipt::CheckOutReceipt;

/// Longest license plate the ledger stores.
pub const MAX_LICENSE_PLATE_LEN: usize = 20;

/// Runs check-in and check-out as one unit of work per call.
///
/// Each call locks only the location it touches, so calls on different
/// locations proceed in parallel.
#[derive(Debug, Clone)]
pub struct OccupancyEngine {
    /// Capacity store, ledger and unit of work.
    store: Arc<dyn OccupancyStore>,
    /// Current hourly rate, read at check-out.
    rates: Arc<dyn RateProvider>,
    /// Source of entry and exit timestamps.
    clock: Arc<dyn Clock>,
}

impl OccupancyEngine {
    /// Creates a new occupancy engine.
    pub fn new(
        store: Arc<dyn OccupancyStore>,
        rates: Arc<dyn RateProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            rates,
            clock,
        }
    }

    /// Creates an engine over a configured backend.
    pub fn from_stores(stores: &Stores, clock: Arc<dyn Clock>) -> Self {
        Self::new(
            Arc::clone(&stores.occupancy),
            Arc::clone(&stores.rates),
            clock,
        )
    }

    /// Park a vehicle: take one slot and open a record.
    ///
    /// Fails with `Validation` for an empty or overlong plate,
    /// `LocationNotFound`, `CapacityExceeded` when no slot is free, or
    /// `ConsistencyViolation` when the counter is already out of range.
    pub async fn check_in(
        &self,
        location_id: LocationId,
        employee_id: EmployeeId,
        license_plate: &str,
    ) -> AppResult<OccupancyRecord> {
        let license_plate = normalize_plate(license_plate)?;

        let mut tx = self.store.begin(location_id).await?;
        let result = self
            .check_in_locked(tx.as_mut(), employee_id, license_plate)
            .await;
        let (record, remaining) = finish(tx, result).await.inspect_err(|e| {
            log_refusal("Check-in", location_id, e);
        })?;

        info!(
            location_id = %location_id,
            record_id = %record.id,
            employee_id = %employee_id,
            available_slots = remaining,
            "Vehicle checked in"
        );
        Ok(record)
    }

    async fn check_in_locked(
        &self,
        tx: &mut dyn LocationTransaction,
        employee_id: EmployeeId,
        license_plate: String,
    ) -> AppResult<(OccupancyRecord, i32)> {
        let location = tx.location();
        if location.available_slots <= 0 {
            return Err(AppError::capacity_exceeded(format!(
                "Location {} has no available slots",
                location.id
            )));
        }
        let location_id = location.id;

        let remaining = tx.adjust_available(-1).await?;
        let record = tx
            .insert_record(NewOccupancyRecord {
                location_id,
                employee_id,
                license_plate,
                entry_time: self.now(),
            })
            .await?;

        Ok((record, remaining))
    }

    /// Release a vehicle: close its record, bill it, and free the slot.
    ///
    /// The cost uses the hourly rate in effect now. Fails with
    /// `RecordNotFoundOrClosed` when the record is unknown, belongs to
    /// another location, is already closed, or the location is gone.
    pub async fn check_out(
        &self,
        record_id: OccupancyRecordId,
        location_id: LocationId,
    ) -> AppResult<CheckOutReceipt> {
        let mut tx = match self.store.begin(location_id).await {
            Ok(tx) => tx,
            Err(e) if e.kind == ErrorKind::LocationNotFound => {
                let err = not_open(record_id, location_id);
                log_refusal("Check-out", location_id, &err);
                return Err(err);
            }
            Err(e) => return Err(e),
        };

        let result = self.check_out_locked(tx.as_mut(), record_id).await;
        let (receipt, remaining) = finish(tx, result).await.inspect_err(|e| {
            log_refusal("Check-out", location_id, e);
        })?;

        info!(
            location_id = %location_id,
            record_id = %record_id,
            cost = %receipt.cost,
            hourly_rate = %receipt.hourly_rate,
            available_slots = remaining,
            "Vehicle checked out"
        );
        Ok(receipt)
    }

    async fn check_out_locked(
        &self,
        tx: &mut dyn LocationTransaction,
        record_id: OccupancyRecordId,
    ) -> AppResult<(CheckOutReceipt, i32)> {
        let location_id = tx.location().id;
        let record = tx
            .find_open_record(record_id)
            .await?
            .ok_or_else(|| not_open(record_id, location_id))?;

        let exit_time = self.now();
        let hourly_rate = self.rates.current().await?;
        let bill = Bill::compute(record.entry_time, exit_time, hourly_rate)?;

        let closed = tx.close_record(record_id, exit_time, bill.cost).await?;
        let remaining = tx.adjust_available(1).await?;

        Ok((CheckOutReceipt::new(&closed, exit_time, bill), remaining))
    }

    /// Current instant at the microsecond precision the ledger stores.
    fn now(&self) -> DateTime<Utc> {
        self.clock.now().trunc_subsecs(6)
    }
}

/// Commit on success, roll back on failure.
async fn finish<T>(mut tx: Box<dyn LocationTransaction>, result: AppResult<T>) -> AppResult<T> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                warn!(error = %rollback_err, "Rollback failed; transaction dropped");
            }
            Err(err)
        }
    }
}

fn normalize_plate(raw: &str) -> AppResult<String> {
    let plate = raw.trim();
    if plate.is_empty() {
        return Err(AppError::validation("License plate must not be empty"));
    }
    if plate.chars().count() > MAX_LICENSE_PLATE_LEN {
        return Err(AppError::validation(format!(
            "License plate must be at most {MAX_LICENSE_PLATE_LEN} characters"
        )));
    }
    Ok(plate.to_string())
}

fn not_open(record_id: OccupancyRecordId, location_id: LocationId) -> AppError {
    AppError::record_not_found_or_closed(format!(
        "No open record {record_id} at location {location_id}"
    ))
}

fn log_refusal(operation: &str, location_id: LocationId, err: &AppError) {
    if err.is_fatal() {
        error!(location_id = %location_id, error = %err, "{operation} hit a broken capacity invariant");
    } else {
        warn!(location_id = %location_id, error = %err, "{operation} refused");
    }
}
