//! In-memory backend for single-node deployments and tests.
//!
//! Each location lives behind its own `tokio::sync::Mutex`, so units of
//! work on different locations never contend.

pub mod fault;
pub mod rate;
pub mod store;
pub mod transaction;

pub use fault::{FaultInjector, FaultPoint};
pub use rate::MemoryRateProvider;
pub use store::MemoryOccupancyStore;
pub use transaction::MemoryLocationTransaction;
