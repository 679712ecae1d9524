//! Parking location entities.

pub mod model;

pub use model::{CreateLocation, Location, UpdateLocation};
