//! Occupancy record lifecycle state.

use serde::{Deserialize, Serialize};
use std::fmt;

/// State of one vehicle stay. The only transition is `Open` to `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OccupancyStatus {
    /// Vehicle is currently parked.
    Open,
    /// Vehicle has been checked out and billed.
    Closed,
}

impl OccupancyStatus {
    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for OccupancyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
