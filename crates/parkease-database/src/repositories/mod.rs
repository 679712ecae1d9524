//! PostgreSQL repositories for ParkEase tables.
//!
//! Pool-level methods run on their own connection. Associated functions
//! taking a `&mut PgConnection` run inside a caller's transaction.

pub mod location;
pub mod occupancy;
pub mod rate;

pub use location::LocationRepository;
pub use occupancy::OccupancyRepository;
pub use rate::RateRepository;
