//! # Offer Expiry Windows
//!
//! [`ExpiryWindow`] is the validated response window attached to a tender
//! at creation time. The window is expressed in whole hours and bounded
//! to `1..=168` (one hour to one week) — a tender that never expires, or
//! one that expires before the carrier can reasonably see it, is rejected
//! at construction.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A bounded tender response window, in whole hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpiryWindow(i64);

impl ExpiryWindow {
    /// Minimum permitted window.
    pub const MIN_HOURS: i64 = 1;
    /// Maximum permitted window (one week).
    pub const MAX_HOURS: i64 = 168;
    /// Window applied when the caller does not specify one.
    pub const DEFAULT_HOURS: i64 = 24;

    /// Create a window from whole hours, enforcing the `1..=168` bound.
    pub fn from_hours(hours: i64) -> Result<Self, ValidationError> {
        if !(Self::MIN_HOURS..=Self::MAX_HOURS).contains(&hours) {
            return Err(ValidationError::ExpiryOutOfRange {
                hours,
                min: Self::MIN_HOURS,
                max: Self::MAX_HOURS,
            });
        }
        Ok(Self(hours))
    }

    /// The window in hours.
    pub fn hours(&self) -> i64 {
        self.0
    }

    /// Compute the expiry instant for an offer created at `from`.
    pub fn expires_at(&self, from: DateTime<Utc>) -> DateTime<Utc> {
        from + Duration::hours(self.0)
    }
}

impl Default for ExpiryWindow {
    fn default() -> Self {
        Self(Self::DEFAULT_HOURS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_bounds_enforced() {
        assert!(ExpiryWindow::from_hours(0).is_err());
        assert!(ExpiryWindow::from_hours(169).is_err());
        assert!(ExpiryWindow::from_hours(-5).is_err());
        assert!(ExpiryWindow::from_hours(1).is_ok());
        assert!(ExpiryWindow::from_hours(168).is_ok());
    }

    #[test]
    fn test_default_is_24_hours() {
        assert_eq!(ExpiryWindow::default().hours(), 24);
    }

    #[test]
    fn test_expires_at_adds_window() {
        let created = Utc.with_ymd_and_hms(2026, 3, 10, 8, 0, 0).unwrap();
        let window = ExpiryWindow::from_hours(24).unwrap();
        let expected = Utc.with_ymd_and_hms(2026, 3, 11, 8, 0, 0).unwrap();
        assert_eq!(window.expires_at(created), expected);
    }
}
