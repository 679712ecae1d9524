//! Hourly rate setting entity model.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use parkease_core::error::AppError;
use parkease_core::result::AppResult;

/// The single current hourly rate. No history is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct RateSetting {
    /// Price per hour of parking.
    pub hourly_rate: Decimal,
    /// When the rate was last changed.
    pub updated_at: DateTime<Utc>,
}

impl RateSetting {
    /// Normalize a candidate rate to cents and check it is strictly positive.
    pub fn validate_rate(rate: Decimal) -> AppResult<Decimal> {
        let rate = rate.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        if rate <= Decimal::ZERO {
            return Err(AppError::invalid_rate(format!(
                "Hourly rate must be positive, got {rate}"
            )));
        }
        Ok(rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parkease_core::error::ErrorKind;
    use rust_decimal_macros::dec;

    #[test]
    fn test_validate_rate() {
        assert_eq!(RateSetting::validate_rate(dec!(2.50)).unwrap(), dec!(2.50));
        assert_eq!(RateSetting::validate_rate(dec!(3.335)).unwrap(), dec!(3.34));
        assert_eq!(
            RateSetting::validate_rate(dec!(0.001)).unwrap_err().kind,
            ErrorKind::InvalidRate
        );
        assert_eq!(
            RateSetting::validate_rate(Decimal::ZERO).unwrap_err().kind,
            ErrorKind::InvalidRate
        );
        assert_eq!(
            RateSetting::validate_rate(dec!(-1)).unwrap_err().kind,
            ErrorKind::InvalidRate
        );
    }
}
