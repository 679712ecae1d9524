//! Occupancy record repository implementation.

use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use futures::stream::{BoxStream, StreamExt};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use parkease_core::result::AppResult;
use parkease_core::types::{LocationId, OccupancyRecordId};
use parkease_entity::occupancy::OccupancyRecord;

use crate::error::classify;

/// Repository for `occupancy_records`.
#[derive(Debug, Clone)]
pub struct OccupancyRepository {
    pool: PgPool,
}

impl OccupancyRepository {
    /// Create a new occupancy repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a record by primary key.
    pub async fn find_by_id(&self, id: OccupancyRecordId) -> AppResult<Option<OccupancyRecord>> {
        sqlx::query_as::<_, OccupancyRecord>("SELECT * FROM occupancy_records WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| classify("Failed to find occupancy record", e))
    }

    /// Stream the open records of a location in entry order.
    ///
    /// Rows are fetched as the stream is polled.
    pub fn stream_open(&self, location_id: LocationId) -> BoxStream<'_, AppResult<OccupancyRecord>> {
        sqlx::query_as::<_, OccupancyRecord>(
            r#"SELECT * FROM occupancy_records
            WHERE location_id = $1 AND exit_time IS NULL
            ORDER BY entry_time, id"#,
        )
        .bind(location_id)
        .fetch(&self.pool)
        .map_err(|e| classify("Failed to stream open records", e))
        .boxed()
    }

    /// Most recent records of a location, newest entry first.
    pub async fn find_recent(
        &self,
        location_id: LocationId,
        limit: u32,
    ) -> AppResult<Vec<OccupancyRecord>> {
        sqlx::query_as::<_, OccupancyRecord>(
            r#"SELECT * FROM occupancy_records
            WHERE location_id = $1
            ORDER BY entry_time DESC, id
            LIMIT $2"#,
        )
        .bind(location_id)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| classify("Failed to list recent records", e))
    }

    /// Count open records at a location.
    pub async fn count_open(&self, location_id: LocationId) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM occupancy_records WHERE location_id = $1 AND exit_time IS NULL",
        )
        .bind(location_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify("Failed to count open records", e))?;

        Ok(count.max(0) as u64)
    }

    /// Count open records inside a transaction.
    pub async fn count_open_in(conn: &mut PgConnection, location_id: LocationId) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM occupancy_records WHERE location_id = $1 AND exit_time IS NULL",
        )
        .bind(location_id)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| classify("Failed to count open records", e))?;

        Ok(count.max(0) as u64)
    }

    /// Insert an open record.
    pub async fn insert_in(
        conn: &mut PgConnection,
        record: &OccupancyRecord,
    ) -> AppResult<OccupancyRecord> {
        sqlx::query_as::<_, OccupancyRecord>(
            r#"INSERT INTO occupancy_records
                (id, location_id, employee_id, license_plate, entry_time)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *"#,
        )
        .bind(record.id)
        .bind(record.location_id)
        .bind(record.employee_id)
        .bind(&record.license_plate)
        .bind(record.entry_time)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| classify("Failed to insert occupancy record", e))
    }

    /// Find and lock an open record belonging to `location_id`.
    pub async fn find_open_for_update(
        conn: &mut PgConnection,
        id: OccupancyRecordId,
        location_id: LocationId,
    ) -> AppResult<Option<OccupancyRecord>> {
        sqlx::query_as::<_, OccupancyRecord>(
            r#"SELECT * FROM occupancy_records
            WHERE id = $1 AND location_id = $2 AND exit_time IS NULL
            FOR UPDATE"#,
        )
        .bind(id)
        .bind(location_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| classify("Failed to lock occupancy record", e))
    }

    /// Close an open record. Returns `None` if no open record matched.
    pub async fn close_in(
        conn: &mut PgConnection,
        id: OccupancyRecordId,
        location_id: LocationId,
        exit_time: DateTime<Utc>,
        cost: Decimal,
    ) -> AppResult<Option<OccupancyRecord>> {
        sqlx::query_as::<_, OccupancyRecord>(
            r#"UPDATE occupancy_records
            SET exit_time = $3, cost = $4
            WHERE id = $1 AND location_id = $2 AND exit_time IS NULL
            RETURNING *"#,
        )
        .bind(id)
        .bind(location_id)
        .bind(exit_time)
        .bind(cost)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| classify("Failed to close occupancy record", e))
    }
}
