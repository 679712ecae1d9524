//! Unit of work backed by a PostgreSQL transaction.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Postgres, Transaction};
use tracing::debug;

use parkease_core::error::AppError;
use parkease_core::result::AppResult;
use parkease_core::types::OccupancyRecordId;
use parkease_entity::location::Location;
use parkease_entity::occupancy::{NewOccupancyRecord, OccupancyRecord};

use crate::error::classify;
use crate::repositories::{LocationRepository, OccupancyRepository};
use crate::store::{LocationTransaction, transaction_finished};

/// An open transaction holding the location row lock.
///
/// Dropping it without committing rolls the transaction back.
pub struct PgLocationTransaction {
    tx: Option<Transaction<'static, Postgres>>,
    location: Location,
}

impl PgLocationTransaction {
    pub(crate) fn new(tx: Transaction<'static, Postgres>, location: Location) -> Self {
        Self {
            tx: Some(tx),
            location,
        }
    }

    fn tx(&mut self) -> AppResult<&mut Transaction<'static, Postgres>> {
        self.tx.as_mut().ok_or_else(transaction_finished)
    }
}

impl fmt::Debug for PgLocationTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgLocationTransaction")
            .field("location_id", &self.location.id)
            .field("open", &self.tx.is_some())
            .finish()
    }
}

#[async_trait]
impl LocationTransaction for PgLocationTransaction {
    fn location(&self) -> &Location {
        &self.location
    }

    async fn adjust_available(&mut self, delta: i32) -> AppResult<i32> {
        let next = self.location.checked_available(delta)?;
        let id = self.location.id;

        let tx = self.tx()?;
        if !LocationRepository::set_available_in(&mut **tx, id, next).await? {
            return Err(AppError::consistency_violation(format!(
                "Location {id} rejected available count {next}"
            )));
        }

        self.location.available_slots = next;
        self.location.updated_at = Utc::now();
        Ok(next)
    }

    async fn insert_record(&mut self, record: NewOccupancyRecord) -> AppResult<OccupancyRecord> {
        if record.location_id != self.location.id {
            return Err(AppError::internal(format!(
                "Record for location {} inserted through location {}",
                record.location_id, self.location.id
            )));
        }

        let record = OccupancyRecord::open(record);
        let tx = self.tx()?;
        OccupancyRepository::insert_in(&mut **tx, &record).await
    }

    async fn find_open_record(
        &mut self,
        id: OccupancyRecordId,
    ) -> AppResult<Option<OccupancyRecord>> {
        let location_id = self.location.id;
        let tx = self.tx()?;
        OccupancyRepository::find_open_for_update(&mut **tx, id, location_id).await
    }

    async fn close_record(
        &mut self,
        id: OccupancyRecordId,
        exit_time: DateTime<Utc>,
        cost: Decimal,
    ) -> AppResult<OccupancyRecord> {
        let location_id = self.location.id;
        let tx = self.tx()?;
        OccupancyRepository::close_in(&mut **tx, id, location_id, exit_time, cost)
            .await?
            .ok_or_else(|| {
                AppError::record_not_found_or_closed(format!(
                    "No open record {id} at location {location_id}"
                ))
            })
    }

    async fn commit(&mut self) -> AppResult<()> {
        let tx = self.tx.take().ok_or_else(transaction_finished)?;
        tx.commit()
            .await
            .map_err(|e| classify("Failed to commit transaction", e))?;

        debug!(
            location_id = %self.location.id,
            available_slots = self.location.available_slots,
            "Committed unit of work"
        );
        Ok(())
    }

    async fn rollback(&mut self) -> AppResult<()> {
        let tx = self.tx.take().ok_or_else(transaction_finished)?;
        tx.rollback()
            .await
            .map_err(|e| classify("Failed to roll back transaction", e))?;

        debug!(location_id = %self.location.id, "Rolled back unit of work");
        Ok(())
    }
}
