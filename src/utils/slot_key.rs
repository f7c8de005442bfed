//! 时段键（slot key）推导
//!
//! A slot key buckets a booking's start time into a discrete bookable unit:
//! `"{hour}_{day}_{month}_{year}"` computed on the UTC instant, with the hour
//! floored to the configured bucket width. Two bookings of the same service
//! collide exactly when their slot keys are equal.

use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotPolicy {
    width_hours: u32,
}

impl Default for SlotPolicy {
    fn default() -> Self {
        Self { width_hours: 1 }
    }
}

impl SlotPolicy {
    /// Width must be between 1 and 24 hours and divide a day evenly.
    pub fn new(width_hours: u32) -> Result<Self, String> {
        if width_hours == 0 || width_hours > 24 || 24 % width_hours != 0 {
            return Err(format!(
                "slot width must divide 24 hours, got {width_hours}"
            ));
        }
        Ok(Self { width_hours })
    }

    pub fn width_hours(&self) -> u32 {
        self.width_hours
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SlotKey(String);

impl SlotKey {
    pub fn derive(scheduled_at: DateTime<Utc>, policy: SlotPolicy) -> Self {
        let hour = scheduled_at.hour() - scheduled_at.hour() % policy.width_hours;
        SlotKey(format!(
            "{}_{}_{}_{}",
            hour,
            scheduled_at.day(),
            scheduled_at.month(),
            scheduled_at.year()
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    #[test]
    fn test_slot_key_format() {
        let at = Utc.with_ymd_and_hms(2025, 6, 10, 14, 30, 0).unwrap();
        let key = SlotKey::derive(at, SlotPolicy::default());
        assert_eq!(key.as_str(), "14_10_6_2025");
    }

    #[test]
    fn test_same_hour_same_key() {
        let a = Utc.with_ymd_and_hms(2025, 6, 10, 14, 0, 0).unwrap();
        let b = Utc.with_ymd_and_hms(2025, 6, 10, 14, 59, 59).unwrap();
        let c = Utc.with_ymd_and_hms(2025, 6, 10, 15, 0, 0).unwrap();
        let policy = SlotPolicy::default();
        assert_eq!(SlotKey::derive(a, policy), SlotKey::derive(b, policy));
        assert_ne!(SlotKey::derive(a, policy), SlotKey::derive(c, policy));
    }

    #[test]
    fn test_key_is_derived_in_utc() {
        // 15:30 at +01:00 is 14:30 UTC
        let offset = FixedOffset::east_opt(3600).unwrap();
        let local = offset.with_ymd_and_hms(2025, 6, 10, 15, 30, 0).unwrap();
        let key = SlotKey::derive(local.with_timezone(&Utc), SlotPolicy::default());
        assert_eq!(key.to_string(), "14_10_6_2025");
    }

    #[test]
    fn test_wider_buckets_floor_the_hour() {
        let policy = SlotPolicy::new(4).unwrap();
        let at = Utc.with_ymd_and_hms(2025, 12, 1, 7, 15, 0).unwrap();
        assert_eq!(SlotKey::derive(at, policy).as_str(), "4_1_12_2025");
        let at = Utc.with_ymd_and_hms(2025, 12, 1, 23, 59, 0).unwrap();
        assert_eq!(SlotKey::derive(at, policy).as_str(), "20_1_12_2025");
    }

    #[test]
    fn test_invalid_widths_rejected() {
        assert!(SlotPolicy::new(0).is_err());
        assert!(SlotPolicy::new(5).is_err());
        assert!(SlotPolicy::new(25).is_err());
        assert!(SlotPolicy::new(24).is_ok());
        assert!(SlotPolicy::new(1).is_ok());
    }
}
