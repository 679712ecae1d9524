//! Parking fee calculation.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use parkease_core::error::AppError;
use parkease_core::result::AppResult;

const MICROS_PER_HOUR: i64 = 3_600_000_000;

/// Fractional digits kept on the billed duration shown to operators.
const HOURS_SCALE: u32 = 4;

/// Fee for one stay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bill {
    /// Stay length in hours, rounded for display.
    pub billed_hours: Decimal,
    /// Rate the stay was billed at.
    pub hourly_rate: Decimal,
    /// Amount due, in cents precision.
    pub cost: Decimal,
}

impl Bill {
    /// Bill a stay from `entry_time` to `exit_time` at `hourly_rate`.
    ///
    /// The duration is taken at microsecond precision with no minimum
    /// charge. The cost is rounded half away from zero to two places.
    /// Fails with `ConsistencyViolation` unless `exit_time > entry_time`.
    pub fn compute(
        entry_time: DateTime<Utc>,
        exit_time: DateTime<Utc>,
        hourly_rate: Decimal,
    ) -> AppResult<Self> {
        if exit_time <= entry_time {
            return Err(AppError::consistency_violation(format!(
                "Exit time {exit_time} is not after entry time {entry_time}"
            )));
        }

        let micros = (exit_time - entry_time).num_microseconds().ok_or_else(|| {
            AppError::consistency_violation(format!(
                "Stay from {entry_time} to {exit_time} is too long to bill"
            ))
        })?;
        let micros = Decimal::from(micros);
        let per_hour = Decimal::from(MICROS_PER_HOUR);

        let cost = (hourly_rate * micros / per_hour)
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        let billed_hours = (micros / per_hour)
            .round_dp_with_strategy(HOURS_SCALE, RoundingStrategy::MidpointAwayFromZero);

        Ok(Self {
            billed_hours,
            hourly_rate,
            cost,
        })
    }
}
