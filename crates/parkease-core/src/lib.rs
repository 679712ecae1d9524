//! # parkease-core
//!
//! Core crate for ParkEase. Contains configuration schemas, typed
//! identifiers, the clock abstraction used for entry/exit timestamps,
//! and the unified error system.
//!
//! This crate has **no** internal dependencies on other ParkEase crates.

pub mod clock;
pub mod config;
pub mod error;
pub mod result;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{AppError, ErrorKind};
pub use result::AppResult;
