//! Occupancy ledger entities.

pub mod model;
pub mod status;

pub use model::{NewOccupancyRecord, OccupancyRecord};
pub use status::OccupancyStatus;
