//! One-shot fault injection for the in-memory backend.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

use tracing::warn;

use parkease_core::error::AppError;
use parkease_core::result::AppResult;

/// A step of a unit of work that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultPoint {
    /// Acquiring the location.
    Begin,
    /// Adjusting the slot counter.
    AdjustAvailable,
    /// Appending a record.
    InsertRecord,
    /// Closing a record.
    CloseRecord,
    /// Publishing staged changes.
    Commit,
}

impl FaultPoint {
    fn bit(self) -> u8 {
        match self {
            Self::Begin => 1 << 0,
            Self::AdjustAvailable => 1 << 1,
            Self::InsertRecord => 1 << 2,
            Self::CloseRecord => 1 << 3,
            Self::Commit => 1 << 4,
        }
    }
}

impl fmt::Display for FaultPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Begin => "begin",
            Self::AdjustAvailable => "adjust_available",
            Self::InsertRecord => "insert_record",
            Self::CloseRecord => "close_record",
            Self::Commit => "commit",
        };
        f.write_str(name)
    }
}

/// Set of armed fault points. Each armed point fails exactly once with
/// `Unavailable`, the way a dropped connection would.
#[derive(Debug, Default)]
pub struct FaultInjector {
    armed: AtomicU8,
}

impl FaultInjector {
    /// Arm a fault point for its next use.
    pub fn arm(&self, point: FaultPoint) {
        self.armed.fetch_or(point.bit(), Ordering::SeqCst);
    }

    /// Disarm every fault point.
    pub fn clear(&self) {
        self.armed.store(0, Ordering::SeqCst);
    }

    /// Whether `point` is currently armed.
    pub fn is_armed(&self, point: FaultPoint) -> bool {
        self.armed.load(Ordering::SeqCst) & point.bit() != 0
    }

    /// Fail if `point` is armed, disarming it.
    pub(crate) fn trip(&self, point: FaultPoint) -> AppResult<()> {
        let previous = self.armed.fetch_and(!point.bit(), Ordering::SeqCst);
        if previous & point.bit() != 0 {
            warn!(fault = %point, "Injected storage fault");
            return Err(AppError::unavailable(format!("Injected fault at {point}")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parkease_core::error::ErrorKind;

    #[test]
    fn test_fault_trips_once() {
        let faults = FaultInjector::default();
        faults.arm(FaultPoint::Commit);
        assert!(faults.is_armed(FaultPoint::Commit));
        assert!(!faults.is_armed(FaultPoint::Begin));

        let err = faults.trip(FaultPoint::Commit).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unavailable);
        assert!(faults.trip(FaultPoint::Commit).is_ok());
    }

    #[test]
    fn test_clear() {
        let faults = FaultInjector::default();
        faults.arm(FaultPoint::InsertRecord);
        faults.arm(FaultPoint::CloseRecord);
        faults.clear();
        assert!(faults.trip(FaultPoint::InsertRecord).is_ok());
        assert!(faults.trip(FaultPoint::CloseRecord).is_ok());
    }
}
