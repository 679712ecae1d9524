//! Parking location repository implementation.

use sqlx::{PgConnection, PgPool};

use parkease_core::result::AppResult;
use parkease_core::types::LocationId;
use parkease_entity::location::{CreateLocation, Location};

use crate::error::classify;

/// Repository for `parking_locations`.
#[derive(Debug, Clone)]
pub struct LocationRepository {
    pool: PgPool,
}

impl LocationRepository {
    /// Create a new location repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a location by primary key.
    pub async fn find_by_id(&self, id: LocationId) -> AppResult<Option<Location>> {
        sqlx::query_as::<_, Location>("SELECT * FROM parking_locations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| classify("Failed to find location", e))
    }

    /// List every location ordered by name.
    pub async fn find_all(&self) -> AppResult<Vec<Location>> {
        sqlx::query_as::<_, Location>("SELECT * FROM parking_locations ORDER BY name, id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| classify("Failed to list locations", e))
    }

    /// Whether a location exists.
    pub async fn exists(&self, id: LocationId) -> AppResult<bool> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM parking_locations WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| classify("Failed to check location", e))
    }

    /// Insert a location with every slot available.
    pub async fn create(&self, data: &CreateLocation) -> AppResult<Location> {
        sqlx::query_as::<_, Location>(
            r#"INSERT INTO parking_locations
                (id, name, latitude, longitude, total_slots, available_slots)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING *"#,
        )
        .bind(LocationId::new())
        .bind(data.name.trim())
        .bind(data.latitude)
        .bind(data.longitude)
        .bind(data.total_slots)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify("Failed to create location", e))
    }

    /// Lock a location row for the rest of the transaction.
    pub async fn lock_by_id(conn: &mut PgConnection, id: LocationId) -> AppResult<Option<Location>> {
        sqlx::query_as::<_, Location>("SELECT * FROM parking_locations WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| classify("Failed to lock location", e))
    }

    /// Write every editable column of a locked location.
    pub async fn update_in(conn: &mut PgConnection, location: &Location) -> AppResult<Location> {
        sqlx::query_as::<_, Location>(
            r#"UPDATE parking_locations SET
                name = $2,
                latitude = $3,
                longitude = $4,
                total_slots = $5,
                available_slots = $6,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *"#,
        )
        .bind(location.id)
        .bind(&location.name)
        .bind(location.latitude)
        .bind(location.longitude)
        .bind(location.total_slots)
        .bind(location.available_slots)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| classify("Failed to update location", e))
    }

    /// Set the available counter of a locked location.
    ///
    /// The range guard in the `WHERE` clause makes an out-of-range write
    /// affect no row.
    pub async fn set_available_in(
        conn: &mut PgConnection,
        id: LocationId,
        available: i32,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r#"UPDATE parking_locations
            SET available_slots = $2, updated_at = NOW()
            WHERE id = $1 AND $2 BETWEEN 0 AND total_slots"#,
        )
        .bind(id)
        .bind(available)
        .execute(&mut *conn)
        .await
        .map_err(|e| classify("Failed to update available slots", e))?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a locked location.
    pub async fn delete_in(conn: &mut PgConnection, id: LocationId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM parking_locations WHERE id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await
            .map_err(|e| classify("Failed to delete location", e))?;

        Ok(result.rows_affected() > 0)
    }
}
