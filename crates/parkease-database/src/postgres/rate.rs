//! PostgreSQL-backed hourly rate.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::info;

use parkease_core::result::AppResult;
use parkease_entity::rate::RateSetting;

use crate::repositories::RateRepository;
use crate::store::RateProvider;

/// Rate provider over the `rate_settings` row.
///
/// The configured default is written the first time the rate is read and
/// no row exists yet.
#[derive(Debug, Clone)]
pub struct PgRateProvider {
    repo: RateRepository,
    default_rate: Decimal,
}

impl PgRateProvider {
    /// Create a provider that seeds `default_rate` when the table is empty.
    pub fn new(pool: PgPool, default_rate: Decimal) -> AppResult<Self> {
        Ok(Self {
            repo: RateRepository::new(pool),
            default_rate: RateSetting::validate_rate(default_rate)?,
        })
    }
}

#[async_trait]
impl RateProvider for PgRateProvider {
    async fn setting(&self) -> AppResult<RateSetting> {
        match self.repo.find().await? {
            Some(setting) => Ok(setting),
            None => {
                info!(hourly_rate = %self.default_rate, "Seeding default hourly rate");
                self.repo.seed(self.default_rate).await
            }
        }
    }

    async fn set(&self, rate: Decimal) -> AppResult<RateSetting> {
        let hourly_rate = RateSetting::validate_rate(rate)?;
        let setting = self.repo.upsert(hourly_rate).await?;
        info!(hourly_rate = %setting.hourly_rate, "Hourly rate updated");
        Ok(setting)
    }
}
