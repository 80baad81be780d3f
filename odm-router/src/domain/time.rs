//! Minute-resolution time handling.
//!
//! The scheduled-transit search operates on a minute-resolution clock,
//! while the mobility broker speaks milliseconds since epoch on the wire.
//! This module provides a `UnixTime` newtype for the internal clock and
//! exact conversions between the two resolutions: sub-minute remainders
//! are floored, never rounded, so a wire timestamp inside minute `m`
//! always maps to minute `m`.

use chrono::Duration;
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};

/// Milliseconds in one internal clock tick.
const MILLIS_PER_MINUTE: i64 = 60_000;

/// An instant on the internal minute-resolution clock.
///
/// Stored as whole minutes since the Unix epoch.
///
/// # Examples
///
/// ```
/// use odm_router::domain::UnixTime;
///
/// let t = UnixTime::from_millis(90_500);
/// assert_eq!(t.minutes(), 1); // floored, not rounded
/// assert_eq!(t.to_millis(), 60_000);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct UnixTime(i64);

impl UnixTime {
    /// Create an instant from whole minutes since the Unix epoch.
    pub const fn from_minutes(minutes: i64) -> Self {
        Self(minutes)
    }

    /// Convert a wire timestamp (milliseconds since epoch) to the internal
    /// clock, flooring any sub-minute remainder.
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis.div_euclid(MILLIS_PER_MINUTE))
    }

    /// Convert to a wire timestamp (milliseconds since epoch).
    pub const fn to_millis(self) -> i64 {
        self.0 * MILLIS_PER_MINUTE
    }

    /// Whole minutes since the Unix epoch.
    pub const fn minutes(self) -> i64 {
        self.0
    }

    /// Round down to the previous full hour.
    pub const fn floor_to_hour(self) -> Self {
        Self(self.0 - self.0.rem_euclid(60))
    }

    /// Round up to the next full hour (identity on full hours).
    pub const fn ceil_to_hour(self) -> Self {
        let rem = self.0.rem_euclid(60);
        if rem == 0 { self } else { Self(self.0 - rem + 60) }
    }

    /// Duration from `other` to `self`; negative if `other` is later.
    pub fn signed_duration_since(self, other: Self) -> Duration {
        Duration::minutes(self.0 - other.0)
    }
}

impl Add<Duration> for UnixTime {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self {
        Self(self.0 + rhs.num_minutes())
    }
}

impl AddAssign<Duration> for UnixTime {
    fn add_assign(&mut self, rhs: Duration) {
        self.0 += rhs.num_minutes();
    }
}

impl Sub<Duration> for UnixTime {
    type Output = Self;

    fn sub(self, rhs: Duration) -> Self {
        Self(self.0 - rhs.num_minutes())
    }
}

impl SubAssign<Duration> for UnixTime {
    fn sub_assign(&mut self, rhs: Duration) {
        self.0 -= rhs.num_minutes();
    }
}

impl Sub for UnixTime {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Duration {
        Duration::minutes(self.0 - rhs.0)
    }
}

impl Ord for UnixTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl PartialOrd for UnixTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for UnixTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UnixTime({}m)", self.0)
    }
}

impl fmt::Display for UnixTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}m", self.0)
    }
}

/// A half-open interval `[from, to)` on the internal clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeInterval {
    pub from: UnixTime,
    pub to: UnixTime,
}

impl TimeInterval {
    /// Create an interval. `from` must not be after `to`.
    pub fn new(from: UnixTime, to: UnixTime) -> Self {
        debug_assert!(from <= to, "interval bounds out of order");
        Self { from, to }
    }

    /// Whether the instant falls within `[from, to)`.
    pub fn contains(&self, t: UnixTime) -> bool {
        self.from <= t && t < self.to
    }

    /// Extend the upper bound forward by `d`.
    pub fn extend_later(&self, d: Duration) -> Self {
        Self {
            from: self.from,
            to: self.to + d,
        }
    }

    /// Extend the lower bound backward by `d`.
    pub fn extend_earlier(&self, d: Duration) -> Self {
        Self {
            from: self.from - d,
            to: self.to,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn millis_roundtrip_on_minute_boundary() {
        let t = UnixTime::from_minutes(1234);
        assert_eq!(UnixTime::from_millis(t.to_millis()), t);
    }

    #[test]
    fn sub_minute_remainders_floored() {
        assert_eq!(UnixTime::from_millis(59_999).minutes(), 0);
        assert_eq!(UnixTime::from_millis(60_000).minutes(), 1);
        assert_eq!(UnixTime::from_millis(119_999).minutes(), 1);
        // Flooring, not rounding toward zero, for pre-epoch stamps.
        assert_eq!(UnixTime::from_millis(-1).minutes(), -1);
        assert_eq!(UnixTime::from_millis(-60_000).minutes(), -1);
        assert_eq!(UnixTime::from_millis(-60_001).minutes(), -2);
    }

    #[test]
    fn hour_rounding() {
        let t = UnixTime::from_minutes(125);
        assert_eq!(t.floor_to_hour().minutes(), 120);
        assert_eq!(t.ceil_to_hour().minutes(), 180);

        let on_hour = UnixTime::from_minutes(180);
        assert_eq!(on_hour.floor_to_hour(), on_hour);
        assert_eq!(on_hour.ceil_to_hour(), on_hour);
    }

    #[test]
    fn arithmetic() {
        let t = UnixTime::from_minutes(100);
        assert_eq!((t + Duration::minutes(30)).minutes(), 130);
        assert_eq!((t - Duration::hours(1)).minutes(), 40);
        assert_eq!(UnixTime::from_minutes(130) - t, Duration::minutes(30));
    }

    #[test]
    fn interval_is_half_open() {
        let iv = TimeInterval::new(UnixTime::from_minutes(10), UnixTime::from_minutes(20));
        assert!(iv.contains(UnixTime::from_minutes(10)));
        assert!(iv.contains(UnixTime::from_minutes(19)));
        assert!(!iv.contains(UnixTime::from_minutes(20)));
        assert!(!iv.contains(UnixTime::from_minutes(9)));
    }

    #[test]
    fn interval_extension() {
        let iv = TimeInterval::new(UnixTime::from_minutes(0), UnixTime::from_minutes(60));
        let later = iv.extend_later(Duration::hours(24));
        assert_eq!(later.to.minutes(), 60 + 24 * 60);
        assert_eq!(later.from.minutes(), 0);

        let earlier = iv.extend_earlier(Duration::hours(24));
        assert_eq!(earlier.from.minutes(), -24 * 60);
        assert_eq!(earlier.to.minutes(), 60);
    }
}
