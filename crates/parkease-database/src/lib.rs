//! # parkease-database
//!
//! Storage for ParkEase: the store traits the occupancy engine is written
//! against, a PostgreSQL backend built on `sqlx`, and an in-memory backend
//! for single-node deployments and tests.

pub mod connection;
pub mod error;
pub mod memory;
pub mod migration;
pub mod postgres;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use store::{
    CapacityStore, LocationTransaction, OccupancyLedger, OccupancyStore, RateProvider, Stores,
    UnitOfWork,
};
