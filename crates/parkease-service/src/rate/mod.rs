//! Hourly rate administration.

pub mod service;

pub use service::RateService;
