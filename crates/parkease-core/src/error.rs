//! Unified application error types for ParkEase.
//!
//! Every crate maps its internal errors into [`AppError`] so failures
//! propagate through `?` with a typed [`ErrorKind`] that callers can match
//! on when translating into a user-facing response.

use std::fmt;
use thiserror::Error;

/// Top-level error kind categorization used across the entire application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// The referenced parking location does not exist.
    LocationNotFound,
    /// The location has no available slot at the instant of commit.
    CapacityExceeded,
    /// The occupancy record does not exist, belongs to another location,
    /// or has already been checked out.
    RecordNotFoundOrClosed,
    /// A billing rate was zero or negative.
    InvalidRate,
    /// The capacity invariant was already broken before the call.
    ConsistencyViolation,
    /// Transient storage failure; the unit of work was rolled back.
    Unavailable,
    /// Input validation failed.
    Validation,
    /// The operation conflicts with current state.
    Conflict,
    /// A non-transient database error occurred.
    Database,
    /// A configuration error occurred.
    Configuration,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// An internal error occurred.
    Internal,
}

impl ErrorKind {
    /// Return the kind as an upper snake case code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LocationNotFound => "LOCATION_NOT_FOUND",
            Self::CapacityExceeded => "CAPACITY_EXCEEDED",
            Self::RecordNotFoundOrClosed => "RECORD_NOT_FOUND_OR_CLOSED",
            Self::InvalidRate => "INVALID_RATE",
            Self::ConsistencyViolation => "CONSISTENCY_VIOLATION",
            Self::Unavailable => "UNAVAILABLE",
            Self::Validation => "VALIDATION",
            Self::Conflict => "CONFLICT",
            Self::Database => "DATABASE",
            Self::Configuration => "CONFIGURATION",
            Self::Serialization => "SERIALIZATION",
            Self::Internal => "INTERNAL",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The unified application error used throughout ParkEase.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a location-not-found error.
    pub fn location_not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::LocationNotFound, message)
    }

    /// Create a capacity-exceeded error.
    pub fn capacity_exceeded(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CapacityExceeded, message)
    }

    /// Create a record-not-found-or-closed error.
    pub fn record_not_found_or_closed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RecordNotFoundOrClosed, message)
    }

    /// Create an invalid-rate error.
    pub fn invalid_rate(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidRate, message)
    }

    /// Create a consistency-violation error.
    pub fn consistency_violation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConsistencyViolation, message)
    }

    /// Create an unavailable (transient) error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unavailable, message)
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Database, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Whether the caller may retry the same call with identical inputs.
    ///
    /// Only transient storage failures qualify. A retried check-in after a
    /// rolled-back failure is a fresh attempt, not a duplicate.
    pub fn is_retryable(&self) -> bool {
        self.kind == ErrorKind::Unavailable
    }

    /// Whether the error reports a broken invariant rather than a refusal.
    pub fn is_fatal(&self) -> bool {
        self.kind == ErrorKind::ConsistencyViolation
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_kind_code() {
        let err = AppError::capacity_exceeded("no free slots");
        assert_eq!(err.to_string(), "CAPACITY_EXCEEDED: no free slots");
    }

    #[test]
    fn test_only_unavailable_is_retryable() {
        assert!(AppError::unavailable("pool timed out").is_retryable());
        assert!(!AppError::capacity_exceeded("full").is_retryable());
        assert!(!AppError::record_not_found_or_closed("gone").is_retryable());
        assert!(!AppError::consistency_violation("broken").is_retryable());
    }

    #[test]
    fn test_consistency_violation_is_fatal() {
        assert!(AppError::consistency_violation("available > total").is_fatal());
        assert!(!AppError::location_not_found("missing").is_fatal());
    }

    #[test]
    fn test_clone_drops_source() {
        let io = std::io::Error::other("socket closed");
        let err = AppError::with_source(ErrorKind::Unavailable, "lost connection", io);
        let cloned = err.clone();
        assert_eq!(cloned.kind, ErrorKind::Unavailable);
        assert!(cloned.source.is_none());
    }
}
