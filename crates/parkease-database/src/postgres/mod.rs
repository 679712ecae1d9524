//! PostgreSQL backend.
//!
//! Units of work are database transactions that hold a `FOR UPDATE` lock
//! on the location row. `lock_timeout` is set per transaction so a stuck
//! holder surfaces as `Unavailable` rather than an unbounded wait.

pub mod rate;
pub mod store;
pub mod transaction;

pub use rate::PgRateProvider;
pub use store::PgOccupancyStore;
pub use transaction::PgLocationTransaction;

use sqlx::{PgPool, Postgres, Transaction};

use parkease_core::result::AppResult;

use crate::error::classify;

/// Open a transaction with a local `lock_timeout`.
pub(crate) async fn begin_with_lock_timeout(
    pool: &PgPool,
    lock_timeout_ms: u64,
) -> AppResult<Transaction<'static, Postgres>> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| classify("Failed to begin transaction", e))?;

    sqlx::query("SELECT set_config('lock_timeout', $1, true)")
        .bind(format!("{lock_timeout_ms}ms"))
        .execute(&mut *tx)
        .await
        .map_err(|e| classify("Failed to set lock timeout", e))?;

    Ok(tx)
}
