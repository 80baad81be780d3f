//! Broker wire format.
//!
//! The dispatch broker speaks JSON over HTTP. Both phases share one
//! request shape; the responses differ: the blacklist phase returns
//! serviceable time windows per candidate group, the whitelist phase
//! returns per-ride booleans mirroring the request order. All wire
//! timestamps are milliseconds since epoch.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::domain::{LatLng, Ride, ServiceWindow, StopId, UnixTime};
use crate::state::{Fixed, OdmRequestState};

/// Candidate stop with the ride times the broker is asked about.
///
/// One entry per distinct stop; `times` carries the instants at which a
/// vehicle would serve that stop, one per candidate ride.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopGroup {
    pub lat: f64,
    pub lng: f64,
    pub times: Vec<i64>,
}

/// A direct ride's time pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectTimes {
    pub departure: i64,
    pub arrival: i64,
}

/// Request body shared by the blacklist and whitelist exchanges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokerRequest {
    pub start: LatLng,
    pub target: LatLng,
    pub start_bus_stops: Vec<StopGroup>,
    pub target_bus_stops: Vec<StopGroup>,
    pub direct_times: Vec<DirectTimes>,
    /// True when the departure is the fixed event of the trip.
    pub start_fixed: bool,
    pub capacities: CapacitiesDto,
}

/// Wire shape of the capacity requirements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacitiesDto {
    pub wheelchairs: u8,
    pub bikes: u8,
    pub passengers: u8,
    pub luggage: u8,
}

/// One serviceable time window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowDto {
    pub start_time: i64,
    pub end_time: i64,
}

impl WindowDto {
    pub fn to_window(self) -> ServiceWindow {
        ServiceWindow {
            from: UnixTime::from_millis(self.start_time),
            to: UnixTime::from_millis(self.end_time),
        }
    }
}

/// Blacklist response: windows per first-mile group, per last-mile
/// group, and for the direct rides.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BlacklistResponse {
    pub start: Vec<Vec<WindowDto>>,
    pub target: Vec<Vec<WindowDto>>,
    pub direct: Vec<WindowDto>,
}

/// Whitelist response: per-ride confirmations mirroring the request's
/// group and time ordering.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct WhitelistResponse {
    pub start: Vec<Vec<bool>>,
    pub target: Vec<Vec<bool>>,
    pub direct: Vec<bool>,
}

/// Which access side of the trip a ride set belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhichMile {
    FirstMile,
    LastMile,
}

/// The instant communicated to the broker for a ride.
///
/// The transit-side anchor includes the transfer buffer; the broker is
/// told the time the vehicle actually serves the stop, so the buffer is
/// peeled off again: before the stop event for first-mile rides, after
/// it for last-mile rides.
pub fn broker_time(ride: &Ride, which: WhichMile, buffer: Duration) -> UnixTime {
    match which {
        WhichMile::FirstMile => ride.time_at_stop - buffer,
        WhichMile::LastMile => ride.time_at_stop + buffer,
    }
}

/// Group rides by stop, preserving order.
///
/// Rides are kept sorted by `(stop, time_at_start, time_at_stop)`
/// throughout the request, so contiguous runs are complete groups. The
/// broker sees one entry per distinct stop and answers in the same
/// order.
pub fn group_by_stop(rides: &[Ride]) -> Vec<(StopId, &[Ride])> {
    let mut groups = Vec::new();
    let mut rest = rides;
    while let Some(first) = rest.first() {
        let len = rest.iter().take_while(|r| r.stop == first.stop).count();
        groups.push((first.stop, &rest[..len]));
        rest = &rest[len..];
    }
    groups
}

/// Assemble the request body for either broker phase from the current
/// ride generation.
///
/// # Panics
///
/// Panics if a ride references a stop the timetable has no coordinates
/// for; candidate stops originate from the timetable itself, so this is
/// a programming error.
pub fn build_request(
    state: &OdmRequestState,
    buffer: Duration,
    stop_position: impl Fn(StopId) -> Option<LatLng>,
) -> BrokerRequest {
    let stop_groups = |rides: &[Ride], which: WhichMile| -> Vec<StopGroup> {
        group_by_stop(rides)
            .into_iter()
            .map(|(stop, rides)| {
                let pos = stop_position(stop)
                    .expect("candidate ride references a stop without coordinates");
                StopGroup {
                    lat: pos.lat,
                    lng: pos.lng,
                    times: rides
                        .iter()
                        .map(|r| broker_time(r, which, buffer).to_millis())
                        .collect(),
                }
            })
            .collect()
    };

    BrokerRequest {
        start: state.from,
        target: state.to,
        start_bus_stops: stop_groups(&state.first_mile, WhichMile::FirstMile),
        target_bus_stops: stop_groups(&state.last_mile, WhichMile::LastMile),
        direct_times: state
            .direct
            .iter()
            .map(|d| DirectTimes {
                departure: d.dep.to_millis(),
                arrival: d.arr.to_millis(),
            })
            .collect(),
        start_fixed: state.fixed == Fixed::Departure,
        capacities: CapacitiesDto {
            wheelchairs: state.capacities.wheelchairs,
            bikes: state.capacities.bikes,
            passengers: state.capacities.passengers,
            luggage: state.capacities.luggage,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Capacities, DirectRide};

    fn t(m: i64) -> UnixTime {
        UnixTime::from_minutes(m)
    }

    fn ride(stop: u32, at_stop: i64, at_start: i64) -> Ride {
        Ride::new(StopId(stop), t(at_stop), t(at_start))
    }

    fn state_with(first: Vec<Ride>, last: Vec<Ride>, direct: Vec<DirectRide>) -> OdmRequestState {
        let mut s = OdmRequestState::new(
            LatLng::new(49.0, 8.4),
            LatLng::new(49.2, 8.6),
            Fixed::Departure,
            Capacities::from_request(true, false, None, None),
        );
        s.first_mile = first;
        s.last_mile = last;
        s.direct = direct;
        s
    }

    fn lookup(stop: StopId) -> Option<LatLng> {
        Some(LatLng::new(f64::from(stop.0), f64::from(stop.0) / 10.0))
    }

    #[test]
    fn groups_one_entry_per_distinct_stop() {
        let rides = vec![ride(1, 20, 0), ride(1, 40, 20), ride(2, 30, 10)];
        let groups = group_by_stop(&rides);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, StopId(1));
        assert_eq!(groups[0].1.len(), 2);
        assert_eq!(groups[1].0, StopId(2));
        assert_eq!(groups[1].1.len(), 1);
    }

    #[test]
    fn broker_times_peel_the_buffer() {
        let buffer = Duration::minutes(5);
        let fm = ride(1, 20, 0);
        assert_eq!(broker_time(&fm, WhichMile::FirstMile, buffer), t(15));
        let lm = ride(1, 20, 40);
        assert_eq!(broker_time(&lm, WhichMile::LastMile, buffer), t(25));
    }

    #[test]
    fn request_carries_grouped_stops_and_capacities() {
        let state = state_with(
            vec![ride(1, 20, 0), ride(1, 80, 60), ride(2, 30, 10)],
            vec![ride(3, 100, 120)],
            vec![DirectRide { dep: t(0), arr: t(45) }],
        );
        let req = build_request(&state, Duration::minutes(5), lookup);

        assert_eq!(req.start_bus_stops.len(), 2);
        assert_eq!(req.start_bus_stops[0].times, vec![t(15).to_millis(), t(75).to_millis()]);
        assert_eq!(req.target_bus_stops.len(), 1);
        assert_eq!(req.target_bus_stops[0].times, vec![t(105).to_millis()]);
        assert_eq!(req.direct_times.len(), 1);
        assert_eq!(req.direct_times[0].departure, 0);
        assert!(req.start_fixed);
        // wheelchair request maps to a wheelchair count of 1
        assert_eq!(req.capacities.wheelchairs, 1);
    }

    #[test]
    fn arrive_by_clears_start_fixed() {
        let mut state = state_with(vec![], vec![], vec![]);
        state.fixed = Fixed::Arrival;
        let req = build_request(&state, Duration::minutes(5), lookup);
        assert!(!req.start_fixed);
    }

    #[test]
    fn request_serializes_camel_case() {
        let state = state_with(vec![ride(1, 20, 0)], vec![], vec![]);
        let req = build_request(&state, Duration::minutes(5), lookup);
        let json = serde_json::to_value(&req).unwrap();

        assert!(json.get("startBusStops").is_some());
        assert!(json.get("targetBusStops").is_some());
        assert!(json.get("directTimes").is_some());
        assert!(json.get("startFixed").is_some());
        assert_eq!(json["capacities"]["wheelchairs"], 1);
        assert_eq!(json["startBusStops"][0]["times"][0], 15 * 60_000);
    }

    #[test]
    fn window_parses_millis_to_minutes() {
        let json = r#"{"startTime": 32400000, "endTime": 43200000}"#;
        let dto: WindowDto = serde_json::from_str(json).unwrap();
        let w = dto.to_window();
        assert_eq!(w.from, UnixTime::from_millis(32_400_000));
        assert_eq!(w.to, UnixTime::from_millis(43_200_000));
    }

    #[test]
    fn blacklist_response_parses() {
        let json = r#"
        {
          "start": [[{"startTime": 32400000, "endTime": 43200000}], [{"startTime": 43200000, "endTime": 64800000}]],
          "target": [[{"startTime": 43200000, "endTime": 64800000}], []],
          "direct": []
        }"#;
        let resp: BlacklistResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.start.len(), 2);
        assert_eq!(resp.target.len(), 2);
        assert!(resp.target[1].is_empty());
        assert!(resp.direct.is_empty());
    }

    #[test]
    fn whitelist_response_parses() {
        let json = r#"{"start": [[true, false]], "target": [], "direct": [true]}"#;
        let resp: WhitelistResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.start[0], vec![true, false]);
        assert_eq!(resp.direct, vec![true]);
    }
}
