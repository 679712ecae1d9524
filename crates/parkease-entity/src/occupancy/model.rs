//! Occupancy record entity model.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use parkease_core::types::{EmployeeId, LocationId, OccupancyRecordId};

use super::status::OccupancyStatus;

/// One vehicle's stay, from check-in to check-out.
///
/// `exit_time` and `cost` are either both `None` (vehicle parked) or both
/// set (vehicle checked out).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct OccupancyRecord {
    /// Unique record identifier.
    pub id: OccupancyRecordId,
    /// Location that owns the slot.
    pub location_id: LocationId,
    /// Employee who performed the check-in.
    pub employee_id: EmployeeId,
    /// Free-text plate; duplicates are allowed.
    pub license_plate: String,
    /// When the vehicle was checked in.
    pub entry_time: DateTime<Utc>,
    /// When the vehicle was checked out.
    pub exit_time: Option<DateTime<Utc>>,
    /// Amount billed at check-out.
    pub cost: Option<Decimal>,
}

impl OccupancyRecord {
    /// Build an open record from check-in data.
    pub fn open(new: NewOccupancyRecord) -> Self {
        Self {
            id: OccupancyRecordId::new(),
            location_id: new.location_id,
            employee_id: new.employee_id,
            license_plate: new.license_plate,
            entry_time: new.entry_time,
            exit_time: None,
            cost: None,
        }
    }

    /// Whether the vehicle is still parked.
    pub fn is_open(&self) -> bool {
        self.exit_time.is_none()
    }

    /// Current lifecycle state.
    pub fn status(&self) -> OccupancyStatus {
        if self.is_open() {
            OccupancyStatus::Open
        } else {
            OccupancyStatus::Closed
        }
    }

    /// Length of the stay, if closed.
    pub fn duration(&self) -> Option<Duration> {
        self.exit_time.map(|exit| exit - self.entry_time)
    }

    /// Close the record in place.
    pub fn close(&mut self, exit_time: DateTime<Utc>, cost: Decimal) {
        self.exit_time = Some(exit_time);
        self.cost = Some(cost);
    }
}

/// Check-in data for a record that has not been stored yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOccupancyRecord {
    /// Location that owns the slot.
    pub location_id: LocationId,
    /// Employee performing the check-in.
    pub employee_id: EmployeeId,
    /// Trimmed license plate.
    pub license_plate: String,
    /// Check-in instant.
    pub entry_time: DateTime<Utc>,
}
