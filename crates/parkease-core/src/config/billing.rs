//! Billing configuration.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Billing defaults applied when the store holds no rate yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingConfig {
    /// Hourly rate seeded into an empty store.
    #[serde(default = "default_hourly_rate")]
    pub default_hourly_rate: Decimal,
    /// Number of records returned by "recent vehicles" listings when the
    /// caller does not pass a limit.
    #[serde(default = "default_recent_limit")]
    pub recent_limit: u32,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            default_hourly_rate: default_hourly_rate(),
            recent_limit: default_recent_limit(),
        }
    }
}

fn default_hourly_rate() -> Decimal {
    Decimal::new(250, 2)
}

fn default_recent_limit() -> u32 {
    20
}
