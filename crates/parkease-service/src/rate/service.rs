//! Hourly rate service.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::info;

use parkease_core::result::AppResult;
use parkease_database::store::RateProvider;
use parkease_entity::rate::RateSetting;

/// Reads and replaces the single hourly rate.
#[derive(Debug, Clone)]
pub struct RateService {
    /// Rate provider.
    rates: Arc<dyn RateProvider>,
}

impl RateService {
    /// Creates a new rate service.
    pub fn new(rates: Arc<dyn RateProvider>) -> Self {
        Self { rates }
    }

    /// The stored rate setting.
    pub async fn current(&self) -> AppResult<RateSetting> {
        self.rates.setting().await
    }

    /// Replace the hourly rate. Records already checked out keep their cost.
    pub async fn set(&self, rate: Decimal) -> AppResult<RateSetting> {
        let previous = self.rates.current().await?;
        let setting = self.rates.set(rate).await?;
        info!(
            previous = %previous,
            hourly_rate = %setting.hourly_rate,
            "Rate changed; applies to subsequent check-outs"
        );
        Ok(setting)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parkease_core::error::ErrorKind;
    use parkease_database::memory::MemoryRateProvider;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_set_rate() {
        let service = RateService::new(Arc::new(MemoryRateProvider::new(dec!(2.50)).unwrap()));
        let setting = service.set(dec!(4.75)).await.unwrap();
        assert_eq!(setting.hourly_rate, dec!(4.75));
        assert_eq!(service.current().await.unwrap().hourly_rate, dec!(4.75));
    }

    #[tokio::test]
    async fn test_set_negative_rate_fails() {
        let service = RateService::new(Arc::new(MemoryRateProvider::new(dec!(2.50)).unwrap()));
        let err = service.set(dec!(-1.00)).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidRate);
        assert_eq!(service.current().await.unwrap().hourly_rate, dec!(2.50));
    }
}
