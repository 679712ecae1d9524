//! Location administration and public availability.

pub mod service;

pub use service::{LocationAvailability, LocationService};
