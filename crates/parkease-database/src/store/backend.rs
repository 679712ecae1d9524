//! Backend selection from configuration.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::info;

use parkease_core::config::{AppConfig, StorageBackend};
use parkease_core::error::AppError;
use parkease_core::result::AppResult;

use super::{OccupancyStore, RateProvider};
use crate::connection::DatabasePool;
use crate::memory::{MemoryOccupancyStore, MemoryRateProvider};
use crate::postgres::{PgOccupancyStore, PgRateProvider};

/// The occupancy store and rate provider of one backend.
#[derive(Debug, Clone)]
pub struct Stores {
    /// Capacity store, ledger and unit of work.
    pub occupancy: Arc<dyn OccupancyStore>,
    /// Current hourly rate.
    pub rates: Arc<dyn RateProvider>,
    /// Connection pool when running on PostgreSQL.
    pub pool: Option<DatabasePool>,
}

impl Stores {
    /// Build the backend named by `storage.backend`.
    pub async fn from_config(config: &AppConfig) -> AppResult<Self> {
        let stores = match config.storage.backend {
            StorageBackend::Memory => Self::memory(config.billing.default_hourly_rate)?,
            StorageBackend::Postgres => {
                let pool = DatabasePool::connect(&config.database).await?;
                Self::postgres(
                    pool,
                    config.database.lock_timeout_ms,
                    config.billing.default_hourly_rate,
                )?
            }
        };

        if !stores.occupancy.health_check().await? {
            return Err(AppError::unavailable(format!(
                "Storage backend '{}' failed its health check",
                stores.occupancy.backend_name()
            )));
        }

        info!(backend = stores.occupancy.backend_name(), "Storage backend ready");
        Ok(stores)
    }

    /// In-memory stores seeded with `default_rate`.
    pub fn memory(default_rate: Decimal) -> AppResult<Self> {
        Ok(Self {
            occupancy: Arc::new(MemoryOccupancyStore::new()),
            rates: Arc::new(MemoryRateProvider::new(default_rate)?),
            pool: None,
        })
    }

    /// PostgreSQL stores on an existing pool.
    pub fn postgres(pool: DatabasePool, lock_timeout_ms: u64, default_rate: Decimal) -> AppResult<Self> {
        Ok(Self {
            occupancy: Arc::new(PgOccupancyStore::new(pool.pool().clone(), lock_timeout_ms)),
            rates: Arc::new(PgRateProvider::new(pool.pool().clone(), default_rate)?),
            pool: Some(pool),
        })
    }
}
