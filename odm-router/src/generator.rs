//! Candidate ride generation.
//!
//! Turns a trip request into first-mile, last-mile and direct on-demand
//! candidates. Access candidates come from the road router's vehicle
//! offsets fed through the timetable's access-event enumeration; direct
//! candidates are synthesized at a fixed cadence across the admissible
//! interval. An empty candidate set is a normal outcome, not an error.

use chrono::Duration;
use tracing::debug;

use crate::config::OdmConfig;
use crate::domain::{DirectRide, LatLng, Ride, TimeInterval, TransportMode};
use crate::external::{RoadRouter, SearchDirection, TransitSearch, UpstreamError};
use crate::state::Fixed;

/// Generate first-mile or last-mile candidate rides around `at`.
///
/// Offsets are requested up to `max_offset`: the configured ride cap,
/// tightened by the direct drive duration when the endpoints are
/// routable (an access ride longer than the drive to the destination
/// cannot beat the direct ride). Offsets outside the configured service
/// area are discarded before the transfer buffer is added; the buffered
/// offsets are then materialized into concrete rides by the timetable.
/// The result is sorted by `(stop, time_at_start, time_at_stop)` so
/// downstream grouping can run linearly.
pub fn mile_rides(
    router: &dyn RoadRouter,
    transit: &dyn TransitSearch,
    config: &OdmConfig,
    at: &LatLng,
    direction: SearchDirection,
    interval: TimeInterval,
    max_offset: Duration,
) -> Result<Vec<Ride>, UpstreamError> {
    if let Some(area) = &config.service_area {
        if !area.contains(at) {
            debug!(lat = at.lat, lng = at.lng, "location outside service area");
            return Ok(Vec::new());
        }
    }

    let mut offsets = router.offsets(at, direction, TransportMode::Odm, max_offset)?;
    offsets.retain(|o| match &config.service_area {
        Some(area) => transit
            .stop_position(o.target)
            .is_some_and(|pos| area.contains(&pos)),
        None => transit.stop_position(o.target).is_some(),
    });
    for offset in &mut offsets {
        offset.duration = offset.duration + config.transfer_buffer();
    }

    if offsets.is_empty() {
        return Ok(Vec::new());
    }

    let mut rides = transit.access_rides(direction, interval, &offsets)?;
    rides.sort_by(|a, b| {
        (a.stop, a.time_at_start, a.time_at_stop).cmp(&(b.stop, b.time_at_start, b.time_at_stop))
    });

    debug!(
        offsets = offsets.len(),
        rides = rides.len(),
        ?direction,
        "generated access candidates"
    );
    Ok(rides)
}

/// Drive duration between the trip endpoints, if both are inside the
/// service area and the road network connects them.
pub fn direct_duration(
    router: &dyn RoadRouter,
    config: &OdmConfig,
    from: &LatLng,
    to: &LatLng,
) -> Result<Option<Duration>, UpstreamError> {
    if let Some(area) = &config.service_area {
        if !area.contains(from) || !area.contains(to) {
            return Ok(None);
        }
    }
    router.route_duration(from, to, TransportMode::Odm)
}

/// Generate direct door-to-door candidates at the configured cadence.
///
/// Depart-after requests step forward from the first full hour inside
/// the interval; arrive-by requests anchor the departure on the last
/// full hour that still arrives within the interval and step backward.
/// Rides are returned in ascending departure order.
pub fn direct_rides(
    config: &OdmConfig,
    duration: Option<Duration>,
    fixed: Fixed,
    interval: TimeInterval,
) -> Vec<DirectRide> {
    let Some(duration) = duration else {
        return Vec::new();
    };
    if duration > config.max_ride() {
        debug!(minutes = duration.num_minutes(), "direct route exceeds ride cap");
        return Vec::new();
    }

    let cadence = config.direct_cadence();
    let mut rides = Vec::new();
    match fixed {
        Fixed::Departure => {
            let mut dep = interval.from.ceil_to_hour();
            while interval.contains(dep) {
                rides.push(DirectRide { dep, arr: dep + duration });
                dep += cadence;
            }
        }
        Fixed::Arrival => {
            let mut dep = (interval.to - duration).floor_to_hour();
            while dep >= interval.from {
                rides.push(DirectRide { dep, arr: dep + duration });
                dep -= cadence;
            }
            rides.reverse();
        }
    }

    debug!(rides = rides.len(), "generated direct candidates");
    rides
}
