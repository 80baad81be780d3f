//! Time-dependent offset encoding.
//!
//! Confirmed candidate rides are discrete opportunities: a pickup exists
//! at exactly one instant, not continuously. The scheduled-transit search
//! consumes step-function profiles, so each ride is encoded as a feasible
//! entry at its instant followed one minute later by an infeasible
//! sentinel entry.
//!
//! Rides are additionally split into a "short" and a "long" bucket by a
//! median split on ride duration. Feeding very heterogeneous durations
//! into a single search would let the longest candidate dominate the
//! search bounds; two buckets keep both granularities explorable without
//! discarding any candidate.

use chrono::Duration;

use crate::domain::{INFEASIBLE, Ride, TdOffset, TransportMode, UnixTime};
use crate::queries::TdOffsetMap;

/// Gap between a feasible entry and its closing sentinel.
fn sentinel_gap() -> Duration {
    Duration::minutes(1)
}

/// Which time anchor of a ride the search keys the profile on.
///
/// Start-side offsets are keyed on the event at the anchor the search
/// sweeps: the outside location for depart-after, the transit stop for
/// arrive-by, and mirrored on the destination side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RideAnchor {
    TimeAtStart,
    TimeAtStop,
}

impl RideAnchor {
    fn of(self, ride: &Ride) -> UnixTime {
        match self {
            RideAnchor::TimeAtStart => ride.time_at_start,
            RideAnchor::TimeAtStop => ride.time_at_stop,
        }
    }
}

/// Rides partitioned into duration buckets.
#[derive(Debug, Clone, Default)]
pub struct RideBuckets {
    pub short: Vec<Ride>,
    pub long: Vec<Ride>,
}

/// Median split on ride duration.
///
/// The first `len / 2` rides after sorting by duration form the short
/// bucket, the rest the long bucket; on odd counts the median element
/// lands in the long bucket. Both buckets are re-sorted by stop so the
/// encoder can group them linearly.
pub fn split_by_ride_time(mut rides: Vec<Ride>) -> RideBuckets {
    rides.sort_by_key(|r| r.ride_time());
    let half = rides.len() / 2;
    let long = rides.split_off(half);
    let mut buckets = RideBuckets { short: rides, long };

    let by_stop = |a: &Ride, b: &Ride| {
        (a.stop, a.time_at_start, a.time_at_stop).cmp(&(b.stop, b.time_at_start, b.time_at_stop))
    };
    buckets.short.sort_by(by_stop);
    buckets.long.sort_by(by_stop);
    buckets
}

/// Encode rides into per-stop step-function profiles.
///
/// Each ride yields two entries: `(anchor instant, ride duration)` and,
/// exactly one minute later, the infeasible sentinel. The search must
/// treat the opportunity as discrete and never interpolate between
/// entries.
pub fn encode_td_offsets(rides: &[Ride], anchor: RideAnchor) -> TdOffsetMap {
    let mut profiles = TdOffsetMap::new();
    for ride in rides {
        let at = anchor.of(ride);
        let entries = profiles.entry(ride.stop).or_default();
        entries.push(TdOffset {
            valid_from: at,
            duration: ride.ride_time(),
            mode: TransportMode::Odm,
        });
        entries.push(TdOffset {
            valid_from: at + sentinel_gap(),
            duration: INFEASIBLE,
            mode: TransportMode::Odm,
        });
    }
    profiles
}
