//! Billing rate entities.

pub mod model;

pub use model::RateSetting;
