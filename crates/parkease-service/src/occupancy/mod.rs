//! Vehicle check-in and check-out.

pub mod billing;
pub mod engine;
pub mod receipt;

pub use billing::Bill;
pub use engine::OccupancyEngine;
pub use receipt::CheckOutReceipt;
