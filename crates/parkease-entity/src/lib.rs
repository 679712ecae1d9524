//! # parkease-entity
//!
//! Domain entity models for ParkEase. Every struct here is either a
//! database row (deriving `sqlx::FromRow`) or a value object passed into
//! the stores.

pub mod location;
pub mod occupancy;
pub mod rate;

pub use location::{CreateLocation, Location, UpdateLocation};
pub use occupancy::{NewOccupancyRecord, OccupancyRecord, OccupancyStatus};
pub use rate::RateSetting;
