//! # parkease-service
//!
//! Business logic for ParkEase. The [`OccupancyEngine`] is the only
//! component that creates or closes occupancy records and moves a
//! location's slot counter; the other services wrap the stores for the
//! administrative and public layers.
//!
//! Services follow constructor injection: every dependency is provided at
//! construction time as an `Arc`.

pub mod location;
pub mod occupancy;
pub mod rate;

pub use location::{LocationAvailability, LocationService};
pub use occupancy::{Bill, CheckOutReceipt, OccupancyEngine};
pub use rate::RateService;
