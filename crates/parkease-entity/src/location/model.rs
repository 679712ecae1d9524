//! Parking location entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use parkease_core::error::AppError;
use parkease_core::result::AppResult;
use parkease_core::types::LocationId;

/// A parking site with a fixed total slot count and a live available count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Location {
    /// Unique location identifier.
    pub id: LocationId,
    /// Display name.
    pub name: String,
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
    /// Total number of slots.
    pub total_slots: i32,
    /// Slots not currently occupied.
    pub available_slots: i32,
    /// When the location was created.
    pub created_at: DateTime<Utc>,
    /// When the location was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Location {
    /// Number of slots currently taken.
    pub fn occupied_slots(&self) -> i32 {
        self.total_slots - self.available_slots
    }

    /// Occupancy as a whole percentage of total slots.
    pub fn occupancy_percent(&self) -> u8 {
        if self.total_slots <= 0 {
            return 0;
        }
        let percent = (f64::from(self.occupied_slots()) / f64::from(self.total_slots)) * 100.0;
        percent.round().clamp(0.0, 100.0) as u8
    }

    /// Whether `0 <= available_slots <= total_slots` holds.
    pub fn is_consistent(&self) -> bool {
        (0..=self.total_slots).contains(&self.available_slots)
    }

    /// Compute the available count after applying `delta`.
    ///
    /// Fails with `ConsistencyViolation` if the counter is already out of
    /// range or would leave `[0, total_slots]`. The value is never clamped.
    pub fn checked_available(&self, delta: i32) -> AppResult<i32> {
        if !self.is_consistent() {
            return Err(AppError::consistency_violation(format!(
                "Location {} has {} available of {} total slots",
                self.id, self.available_slots, self.total_slots
            )));
        }

        let next = self
            .available_slots
            .checked_add(delta)
            .filter(|next| (0..=self.total_slots).contains(next))
            .ok_or_else(|| {
                AppError::consistency_violation(format!(
                    "Adjusting location {} by {delta} would leave {} available of {} total slots",
                    self.id,
                    i64::from(self.available_slots) + i64::from(delta),
                    self.total_slots
                ))
            })?;

        Ok(next)
    }
}

/// Data for creating a new location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLocation {
    /// Display name.
    pub name: String,
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
    /// Total number of slots; the location starts fully available.
    pub total_slots: i32,
}

impl CreateLocation {
    /// Validate the request before it reaches a store.
    pub fn validate(&self) -> AppResult<()> {
        validate_common(&self.name, self.latitude, self.longitude, self.total_slots)
    }
}

/// Data for editing an existing location.
///
/// Changing `total_slots` from `T` to `T'` shifts `available_slots` by
/// `T' - T`. The result is not clamped; resolving a degenerate edit is
/// left to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateLocation {
    /// Display name.
    pub name: String,
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
    /// New total number of slots.
    pub total_slots: i32,
}

impl UpdateLocation {
    /// Validate the request before it reaches a store.
    pub fn validate(&self) -> AppResult<()> {
        validate_common(&self.name, self.latitude, self.longitude, self.total_slots)
    }

    /// Apply this edit to `location` in place.
    pub fn apply_to(&self, location: &mut Location, now: DateTime<Utc>) {
        let delta = self.total_slots - location.total_slots;
        location.name = self.name.trim().to_string();
        location.latitude = self.latitude;
        location.longitude = self.longitude;
        location.total_slots = self.total_slots;
        location.available_slots += delta;
        location.updated_at = now;
    }
}

fn validate_common(name: &str, latitude: f64, longitude: f64, total_slots: i32) -> AppResult<()> {
    if name.trim().is_empty() {
        return Err(AppError::validation("Location name must not be empty"));
    }
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(AppError::validation("Latitude must be between -90 and 90"));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(AppError::validation("Longitude must be between -180 and 180"));
    }
    if total_slots <= 0 {
        return Err(AppError::validation("Total slots must be positive"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use parkease_core::error::ErrorKind;

    fn location(total: i32, available: i32) -> Location {
        let now = Utc::now();
        Location {
            id: LocationId::new(),
            name: "Downtown Parking".to_string(),
            latitude: 40.7128,
            longitude: -74.0060,
            total_slots: total,
            available_slots: available,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_checked_available_within_range() {
        let loc = location(10, 3);
        assert_eq!(loc.checked_available(-1).unwrap(), 2);
        assert_eq!(loc.checked_available(1).unwrap(), 4);
    }

    #[test]
    fn test_checked_available_rejects_below_zero() {
        let err = location(10, 0).checked_available(-1).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ConsistencyViolation);
    }

    #[test]
    fn test_checked_available_rejects_above_total() {
        let err = location(10, 10).checked_available(1).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ConsistencyViolation);
    }

    #[test]
    fn test_checked_available_rejects_already_broken_counter() {
        let err = location(10, 12).checked_available(-1).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ConsistencyViolation);
    }

    #[test]
    fn test_occupancy_percent() {
        assert_eq!(location(100, 100).occupancy_percent(), 0);
        assert_eq!(location(3, 1).occupancy_percent(), 67);
        assert_eq!(location(4, 0).occupancy_percent(), 100);
    }

    #[test]
    fn test_update_shifts_available_by_delta() {
        let mut loc = location(10, 4);
        let edit = UpdateLocation {
            name: "  Uptown  ".to_string(),
            latitude: 1.0,
            longitude: 2.0,
            total_slots: 15,
        };
        edit.apply_to(&mut loc, Utc::now());
        assert_eq!(loc.total_slots, 15);
        assert_eq!(loc.available_slots, 9);
        assert_eq!(loc.name, "Uptown");
    }

    #[test]
    fn test_update_may_leave_degenerate_counter() {
        let mut loc = location(10, 2);
        let edit = UpdateLocation {
            name: "Shrunk".to_string(),
            latitude: 0.0,
            longitude: 0.0,
            total_slots: 5,
        };
        edit.apply_to(&mut loc, Utc::now());
        assert_eq!(loc.available_slots, -3);
        assert!(!loc.is_consistent());
    }

    #[test]
    fn test_create_validation() {
        let mut req = CreateLocation {
            name: "Airport".to_string(),
            latitude: 10.0,
            longitude: 20.0,
            total_slots: 50,
        };
        assert!(req.validate().is_ok());

        req.total_slots = 0;
        assert_eq!(req.validate().unwrap_err().kind, ErrorKind::Validation);

        req.total_slots = 5;
        req.name = "   ".to_string();
        assert_eq!(req.validate().unwrap_err().kind, ErrorKind::Validation);
    }
}
