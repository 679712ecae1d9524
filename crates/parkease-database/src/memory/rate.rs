//! In-memory hourly rate.

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use tracing::info;

use parkease_core::result::AppResult;
use parkease_entity::rate::RateSetting;

use crate::store::RateProvider;

/// Rate provider holding the setting in process memory.
#[derive(Debug)]
pub struct MemoryRateProvider {
    setting: RwLock<RateSetting>,
}

impl MemoryRateProvider {
    /// Create a provider seeded with `initial`.
    pub fn new(initial: Decimal) -> AppResult<Self> {
        let hourly_rate = RateSetting::validate_rate(initial)?;
        Ok(Self {
            setting: RwLock::new(RateSetting {
                hourly_rate,
                updated_at: Utc::now(),
            }),
        })
    }
}

#[async_trait]
impl RateProvider for MemoryRateProvider {
    async fn setting(&self) -> AppResult<RateSetting> {
        Ok(self.setting.read().await.clone())
    }

    async fn set(&self, rate: Decimal) -> AppResult<RateSetting> {
        let hourly_rate = RateSetting::validate_rate(rate)?;
        let mut setting = self.setting.write().await;
        *setting = RateSetting {
            hourly_rate,
            updated_at: Utc::now(),
        };
        info!(hourly_rate = %hourly_rate, "Hourly rate updated");
        Ok(setting.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parkease_core::error::ErrorKind;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_set_and_current() {
        let rates = MemoryRateProvider::new(dec!(2.50)).unwrap();
        assert_eq!(rates.current().await.unwrap(), dec!(2.50));

        rates.set(dec!(10.00)).await.unwrap();
        assert_eq!(rates.current().await.unwrap(), dec!(10.00));
    }

    #[tokio::test]
    async fn test_rejects_non_positive_rate() {
        let rates = MemoryRateProvider::new(dec!(2.50)).unwrap();
        let err = rates.set(dec!(0)).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidRate);
        assert_eq!(rates.current().await.unwrap(), dec!(2.50));
    }
}
