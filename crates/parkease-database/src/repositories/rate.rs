//! Hourly rate repository implementation.

use rust_decimal::Decimal;
use sqlx::PgPool;

use parkease_core::result::AppResult;
use parkease_entity::rate::RateSetting;

use crate::error::classify;

/// Repository for the single-row `rate_settings` table.
#[derive(Debug, Clone)]
pub struct RateRepository {
    pool: PgPool,
}

impl RateRepository {
    /// Create a new rate repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Load the stored rate, if any.
    pub async fn find(&self) -> AppResult<Option<RateSetting>> {
        sqlx::query_as::<_, RateSetting>(
            "SELECT hourly_rate, updated_at FROM rate_settings WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| classify("Failed to load hourly rate", e))
    }

    /// Store `rate` unless a rate already exists, then return the stored one.
    pub async fn seed(&self, rate: Decimal) -> AppResult<RateSetting> {
        sqlx::query("INSERT INTO rate_settings (id, hourly_rate) VALUES (1, $1) ON CONFLICT (id) DO NOTHING")
            .bind(rate)
            .execute(&self.pool)
            .await
            .map_err(|e| classify("Failed to seed hourly rate", e))?;

        sqlx::query_as::<_, RateSetting>(
            "SELECT hourly_rate, updated_at FROM rate_settings WHERE id = 1",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify("Failed to load hourly rate", e))
    }

    /// Replace the stored rate.
    pub async fn upsert(&self, rate: Decimal) -> AppResult<RateSetting> {
        sqlx::query_as::<_, RateSetting>(
            r#"INSERT INTO rate_settings (id, hourly_rate, updated_at)
            VALUES (1, $1, NOW())
            ON CONFLICT (id) DO UPDATE
                SET hourly_rate = EXCLUDED.hourly_rate, updated_at = EXCLUDED.updated_at
            RETURNING hourly_rate, updated_at"#,
        )
        .bind(rate)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify("Failed to update hourly rate", e))
    }
}
