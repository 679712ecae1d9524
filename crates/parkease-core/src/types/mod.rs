//! Core type definitions used across the ParkEase workspace.

pub mod id;

pub use id::*;
