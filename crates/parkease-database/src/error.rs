//! Mapping of sqlx failures onto [`AppError`] kinds.
//!
//! Connection loss, pool exhaustion and lock or statement timeouts become
//! `Unavailable`, which callers may retry. Everything else is `Database`.

use parkease_core::error::{AppError, ErrorKind};

/// PostgreSQL SQLSTATE codes that indicate a transient condition.
const TRANSIENT_SQLSTATES: &[&str] = &[
    "40001", // serialization_failure
    "40P01", // deadlock_detected
    "55P03", // lock_not_available
    "57014", // query_canceled (statement_timeout)
    "57P01", // admin_shutdown
];

/// Convert a sqlx error into an [`AppError`] with a context message.
pub fn classify(context: &str, err: sqlx::Error) -> AppError {
    let kind = if is_transient(&err) {
        ErrorKind::Unavailable
    } else {
        ErrorKind::Database
    };
    AppError::with_source(kind, format!("{context}: {err}"), err)
}

/// Whether retrying the same unit of work could succeed.
pub fn is_transient(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => true,
        sqlx::Error::Database(db) => db
            .code()
            .is_some_and(|code| TRANSIENT_SQLSTATES.contains(&&*code)),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_timeout_is_unavailable() {
        let err = classify("Failed to begin transaction", sqlx::Error::PoolTimedOut);
        assert_eq!(err.kind, ErrorKind::Unavailable);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_io_error_is_unavailable() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset by peer");
        assert!(is_transient(&sqlx::Error::Io(io)));
    }

    #[test]
    fn test_row_not_found_is_database() {
        let err = classify("Failed to load location", sqlx::Error::RowNotFound);
        assert_eq!(err.kind, ErrorKind::Database);
        assert!(!err.is_retryable());
    }
}
