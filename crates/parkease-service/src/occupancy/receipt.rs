//! Check-out receipt.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use parkease_core::types::{LocationId, OccupancyRecordId};
use parkease_entity::occupancy::OccupancyRecord;

use super::billing::Bill;

/// What the operator hands back to the driver at check-out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckOutReceipt {
    /// Closed record.
    pub record_id: OccupancyRecordId,
    /// Location the vehicle left.
    pub location_id: LocationId,
    /// Plate as recorded at check-in.
    pub license_plate: String,
    /// Check-in instant.
    pub entry_time: DateTime<Utc>,
    /// Check-out instant.
    pub exit_time: DateTime<Utc>,
    /// Stay length in hours.
    pub billed_hours: Decimal,
    /// Rate in effect at check-out.
    pub hourly_rate: Decimal,
    /// Amount due.
    pub cost: Decimal,
}

impl CheckOutReceipt {
    pub(crate) fn new(record: &OccupancyRecord, exit_time: DateTime<Utc>, bill: Bill) -> Self {
        Self {
            record_id: record.id,
            location_id: record.location_id,
            license_plate: record.license_plate.clone(),
            entry_time: record.entry_time,
            exit_time,
            billed_hours: bill.billed_hours,
            hourly_rate: bill.hourly_rate,
            cost: bill.cost,
        }
    }
}
