//! Candidate on-demand rides and their broker-confirmed service windows.

use chrono::Duration;

use super::location::StopId;
use super::time::UnixTime;

/// A materialized access/egress event: an on-demand vehicle connecting a
/// transit stop with the trip's outside location.
///
/// Two time anchors are required because an ODM ride's true duration is
/// uncertain until the broker confirms it: `time_at_stop` is what the
/// scheduled-transit search consumes, `time_at_start` (the outside
/// location) is what is exchanged with the broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ride {
    pub stop: StopId,
    pub time_at_stop: UnixTime,
    pub time_at_start: UnixTime,
}

impl Ride {
    pub fn new(stop: StopId, time_at_stop: UnixTime, time_at_start: UnixTime) -> Self {
        Self {
            stop,
            time_at_stop,
            time_at_start,
        }
    }

    /// The ride's travel time, independent of direction.
    pub fn ride_time(&self) -> Duration {
        let d = self.time_at_stop - self.time_at_start;
        if d < Duration::zero() { -d } else { d }
    }
}

/// A fully on-demand (non-transit) journey option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DirectRide {
    pub dep: UnixTime,
    pub arr: UnixTime,
}

/// A half-open interval `[from, to)` during which a stop/candidate
/// pairing is broker-confirmed serviceable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceWindow {
    pub from: UnixTime,
    pub to: UnixTime,
}

impl ServiceWindow {
    pub fn contains(&self, t: UnixTime) -> bool {
        self.from <= t && t < self.to
    }
}

/// Vehicle capacity requirements of a trip request.
///
/// Carried unchanged through candidate generation and the broker
/// protocol; the broker uses them to filter vehicle eligibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capacities {
    pub wheelchairs: u8,
    pub bikes: u8,
    pub passengers: u8,
    pub luggage: u8,
}

impl Capacities {
    /// Derive capacities from request flags: a wheelchair pedestrian
    /// profile maps to one wheelchair place, bike transport to one bike.
    pub fn from_request(
        wheelchair: bool,
        bike_transport: bool,
        passengers: Option<u8>,
        luggage: Option<u8>,
    ) -> Self {
        Self {
            wheelchairs: u8::from(wheelchair),
            bikes: u8::from(bike_transport),
            passengers: passengers.unwrap_or(1),
            luggage: luggage.unwrap_or(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(m: i64) -> UnixTime {
        UnixTime::from_minutes(m)
    }

    #[test]
    fn ride_time_is_absolute() {
        // first-mile: start before stop
        let fm = Ride::new(StopId(1), t(120), t(100));
        assert_eq!(fm.ride_time(), Duration::minutes(20));
        // last-mile: stop before start
        let lm = Ride::new(StopId(1), t(100), t(120));
        assert_eq!(lm.ride_time(), Duration::minutes(20));
    }

    #[test]
    fn service_window_half_open() {
        let w = ServiceWindow { from: t(10), to: t(20) };
        assert!(w.contains(t(10)));
        assert!(!w.contains(t(20)));
    }

    #[test]
    fn capacities_from_wheelchair_request() {
        let cap = Capacities::from_request(true, false, None, None);
        assert_eq!(cap.wheelchairs, 1);
        assert_eq!(cap.bikes, 0);
        assert_eq!(cap.passengers, 1);
        assert_eq!(cap.luggage, 0);
    }

    #[test]
    fn capacities_explicit_counts() {
        let cap = Capacities::from_request(false, true, Some(3), Some(2));
        assert_eq!(cap.wheelchairs, 0);
        assert_eq!(cap.bikes, 1);
        assert_eq!(cap.passengers, 3);
        assert_eq!(cap.luggage, 2);
    }
}
