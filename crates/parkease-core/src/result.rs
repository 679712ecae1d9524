//! Convenience result type alias for ParkEase.

use crate::error::AppError;

/// A specialized `Result` type for ParkEase operations.
pub type AppResult<T> = Result<T, AppError>;
