//! Schema migrations for the parking tables.

use sqlx::PgPool;
use sqlx::migrate::{MigrateError, Migrator};
use tracing::info;

use parkease_core::error::{AppError, ErrorKind};

use crate::error::classify;

/// Migrations embedded from the workspace `migrations/` directory.
static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

/// Apply every pending migration.
///
/// A lost connection while migrating is `Unavailable`; a migration that
/// conflicts with the recorded history is `Database`.
pub async fn run_migrations(pool: &PgPool) -> Result<(), AppError> {
    info!(known = MIGRATOR.iter().count(), "Running database migrations");

    MIGRATOR.run(pool).await.map_err(|e| match e {
        MigrateError::Execute(inner) => classify("Failed to run migrations", inner),
        other => AppError::with_source(
            ErrorKind::Database,
            format!("Failed to run migrations: {other}"),
            other,
        ),
    })?;

    info!("Database migrations completed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parking_schema_is_embedded() {
        let parking = MIGRATOR
            .iter()
            .find(|m| m.description == "parking")
            .expect("parking migration embedded");
        assert!(parking.sql.contains("occupancy_records"));
        assert!(parking.sql.contains("rate_settings"));
    }
}
