//! Store traits implemented by every backend.
//!
//! The occupancy engine only talks to these traits. A backend provides:
//!
//! - [`CapacityStore`]: per-location slot counters and location admin.
//! - [`OccupancyLedger`]: read access to vehicle stays.
//! - [`UnitOfWork`]: an exclusive, all-or-nothing transaction scoped to a
//!   single location, the only way to adjust a counter or to insert/close
//!   a record.
//! - [`RateProvider`]: the single current hourly rate.

pub mod backend;

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use rust_decimal::Decimal;

use parkease_core::error::AppError;
use parkease_core::result::AppResult;
use parkease_core::types::{LocationId, OccupancyRecordId};
use parkease_entity::location::{CreateLocation, Location, UpdateLocation};
use parkease_entity::occupancy::{NewOccupancyRecord, OccupancyRecord};
use parkease_entity::rate::RateSetting;

pub use backend::Stores;

/// Upper bound for "recent records" listings.
pub const MAX_RECENT_LIMIT: u32 = 100;

/// Durable storage of per-location slot counters.
#[async_trait]
pub trait CapacityStore: Send + Sync + fmt::Debug + 'static {
    /// Find a location by ID.
    async fn find_location(&self, id: LocationId) -> AppResult<Option<Location>>;

    /// List all locations ordered by name.
    async fn list_locations(&self) -> AppResult<Vec<Location>>;

    /// Create a location with every slot available.
    async fn create_location(&self, req: &CreateLocation) -> AppResult<Location>;

    /// Edit a location, shifting `available_slots` by the change in
    /// `total_slots` without clamping.
    async fn update_location(&self, id: LocationId, req: &UpdateLocation) -> AppResult<Location>;

    /// Delete a location that has no parked vehicles.
    async fn delete_location(&self, id: LocationId) -> AppResult<()>;

    /// Current available slot count.
    async fn get_available(&self, id: LocationId) -> AppResult<i32> {
        self.find_location(id)
            .await?
            .map(|location| location.available_slots)
            .ok_or_else(|| AppError::location_not_found(format!("Location {id} not found")))
    }
}

/// Read access to the occupancy ledger.
///
/// Inserts and closes only happen through a [`LocationTransaction`].
#[async_trait]
pub trait OccupancyLedger: Send + Sync + fmt::Debug + 'static {
    /// Find a record by ID regardless of location or state.
    async fn find_record(&self, id: OccupancyRecordId) -> AppResult<Option<OccupancyRecord>>;

    /// Lazily stream the parked vehicles of a location in entry order.
    ///
    /// An unknown location yields an empty stream.
    fn find_open_by_location(
        &self,
        location_id: LocationId,
    ) -> BoxStream<'_, AppResult<OccupancyRecord>>;

    /// Most recent records of a location, newest entry first.
    ///
    /// `limit` is clamped to `1..=MAX_RECENT_LIMIT`.
    async fn find_recent(
        &self,
        location_id: LocationId,
        limit: u32,
    ) -> AppResult<Vec<OccupancyRecord>>;

    /// Number of parked vehicles at a location.
    async fn count_open(&self, location_id: LocationId) -> AppResult<u64>;
}

/// Opens exclusive, atomic units of work scoped to one location.
#[async_trait]
pub trait UnitOfWork: Send + Sync + fmt::Debug + 'static {
    /// Acquire exclusive access to a location's counter and ledger.
    ///
    /// Blocks while another unit of work holds the same location. Fails
    /// with `LocationNotFound` if the location does not exist.
    async fn begin(&self, location_id: LocationId) -> AppResult<Box<dyn LocationTransaction>>;
}

/// An open unit of work on one location.
///
/// Mutations are staged and become visible only on [`commit`]. Dropping
/// the transaction without committing discards them.
///
/// [`commit`]: LocationTransaction::commit
#[async_trait]
pub trait LocationTransaction: Send {
    /// The locked location, reflecting adjustments staged so far.
    fn location(&self) -> &Location;

    /// Shift `available_slots` by `delta` and return the new value.
    ///
    /// Fails with `ConsistencyViolation` if the result would leave
    /// `[0, total_slots]` or the counter is already out of range.
    async fn adjust_available(&mut self, delta: i32) -> AppResult<i32>;

    /// Append an open record to the ledger.
    async fn insert_record(&mut self, record: NewOccupancyRecord) -> AppResult<OccupancyRecord>;

    /// Find an open record belonging to this location, locking it.
    async fn find_open_record(
        &mut self,
        id: OccupancyRecordId,
    ) -> AppResult<Option<OccupancyRecord>>;

    /// Close an open record. Fails with `RecordNotFoundOrClosed` if the
    /// record is missing, foreign, or already closed.
    async fn close_record(
        &mut self,
        id: OccupancyRecordId,
        exit_time: DateTime<Utc>,
        cost: Decimal,
    ) -> AppResult<OccupancyRecord>;

    /// Make every staged mutation visible at once.
    async fn commit(&mut self) -> AppResult<()>;

    /// Discard every staged mutation and release the location.
    async fn rollback(&mut self) -> AppResult<()>;
}

/// A complete occupancy backend.
#[async_trait]
pub trait OccupancyStore: CapacityStore + OccupancyLedger + UnitOfWork {
    /// Short backend name for logs.
    fn backend_name(&self) -> &'static str;

    /// Check that the backend is reachable.
    async fn health_check(&self) -> AppResult<bool>;
}

/// Source of the current hourly billing rate.
#[async_trait]
pub trait RateProvider: Send + Sync + fmt::Debug + 'static {
    /// The stored rate setting.
    async fn setting(&self) -> AppResult<RateSetting>;

    /// Replace the rate. Fails with `InvalidRate` unless `rate > 0`.
    async fn set(&self, rate: Decimal) -> AppResult<RateSetting>;

    /// The rate in effect right now.
    async fn current(&self) -> AppResult<Decimal> {
        Ok(self.setting().await?.hourly_rate)
    }
}

/// Clamp a caller-supplied listing limit.
pub fn clamp_recent_limit(limit: u32) -> u32 {
    limit.clamp(1, MAX_RECENT_LIMIT)
}

/// Error returned by operations on a finished transaction.
pub(crate) fn transaction_finished() -> AppError {
    AppError::internal("Transaction already committed or rolled back")
}
