//! Itinerary merge and repair.
//!
//! Raw search results still carry the transfer buffer inside their ODM
//! access legs and may repeat across the nine variants. This module
//! pairs each itinerary with the candidate rides it used, re-expresses
//! the buffer as an explicit connecting leg, deduplicates, filters on
//! whitelist confirmation and merges everything into the final ordered
//! list.

use std::collections::HashSet;

use chrono::Duration;
use tracing::debug;

use crate::broker::ConfirmedRides;
use crate::domain::{Itinerary, Leg, Location, OffsetLeg, Ride, StopId, TransportMode, UnixTime};
use crate::state::OdmRequestState;

/// An itinerary paired with the candidate rides its ODM legs realize.
///
/// Pairing happens before repair, while the leg times still equal the
/// ride anchors exactly.
#[derive(Debug, Clone)]
pub struct Annotated {
    pub itinerary: Itinerary,
    pub first_mile: Option<Ride>,
    pub last_mile: Option<Ride>,
}

fn boundary_stop(location: &Location) -> StopId {
    match location {
        Location::Stop(stop) => *stop,
        Location::Coordinate(_) => {
            panic!("ODM access leg does not border a transit stop")
        }
    }
}

/// Pair an itinerary with the rides backing its ODM access legs.
///
/// # Panics
///
/// Panics if an ODM leg references a ride absent from the request
/// state. The search can only use offsets derived from the state's
/// candidates, so a miss is a programming error.
pub fn annotate(itinerary: Itinerary, state: &OdmRequestState) -> Annotated {
    let mut first_mile = None;
    let mut last_mile = None;

    if itinerary.legs.len() >= 2 {
        if let Some(first) = itinerary.legs.first() {
            if first.is_odm() {
                let Leg::Offset(leg) = first else { unreachable!() };
                let stop = boundary_stop(&leg.to);
                first_mile = Some(
                    *state
                        .first_mile
                        .iter()
                        .find(|r| {
                            r.stop == stop
                                && r.time_at_stop == leg.arr
                                && r.time_at_start == leg.dep
                        })
                        .expect("itinerary uses a first-mile ride absent from the request state"),
                );
            }
        }
        if let Some(last) = itinerary.legs.last() {
            if last.is_odm() {
                let Leg::Offset(leg) = last else { unreachable!() };
                let stop = boundary_stop(&leg.from);
                last_mile = Some(
                    *state
                        .last_mile
                        .iter()
                        .find(|r| {
                            r.stop == stop
                                && r.time_at_stop == leg.dep
                                && r.time_at_start == leg.arr
                        })
                        .expect("itinerary uses a last-mile ride absent from the request state"),
                );
            }
        }
    }

    Annotated { itinerary, first_mile, last_mile }
}

fn connecting_leg(at: Location, dep: UnixTime, duration: Duration) -> Leg {
    Leg::Offset(OffsetLeg {
        mode: TransportMode::Walk,
        from: at,
        to: at,
        dep,
        arr: dep + duration,
    })
}

/// Re-express the transfer buffer as an explicit connecting leg.
///
/// A first-mile ODM leg is shortened by the buffer at its arrival and a
/// zero-distance walk of exactly the buffer's length is inserted after
/// it; last-mile legs are handled mirror-image. The itinerary's overall
/// start and end times are unchanged and leg times stay continuous.
pub fn repair_transfer_buffer(itinerary: &mut Itinerary, buffer: Duration) {
    if itinerary.legs.len() < 2 {
        return;
    }

    if itinerary.legs[0].is_odm() {
        let Leg::Offset(leg) = &mut itinerary.legs[0] else { unreachable!() };
        leg.arr = leg.arr - buffer;
        let walk = connecting_leg(leg.to, leg.arr, buffer);
        itinerary.legs.insert(1, walk);
    }

    let last = itinerary.legs.len() - 1;
    if itinerary.legs[last].is_odm() {
        let Leg::Offset(leg) = &mut itinerary.legs[last] else { unreachable!() };
        let original_dep = leg.dep;
        leg.dep = leg.dep + buffer;
        let walk = connecting_leg(leg.from, original_dep, buffer);
        itinerary.legs.insert(last, walk);
    }
}

/// Keep the first itinerary for each (start, end, transfers) signature.
pub fn dedup(annotated: Vec<Annotated>) -> Vec<Annotated> {
    let mut seen = HashSet::new();
    annotated
        .into_iter()
        .filter(|a| seen.insert(a.itinerary.signature()))
        .collect()
}

/// The distinct rides referenced by the surviving itineraries, sorted
/// for the whitelist request.
pub fn collect_used_rides(annotated: &[Annotated]) -> (Vec<Ride>, Vec<Ride>) {
    let collect = |pick: fn(&Annotated) -> Option<Ride>| -> Vec<Ride> {
        let mut rides: Vec<Ride> = annotated.iter().filter_map(pick).collect();
        rides.sort_by(|a, b| {
            (a.stop, a.time_at_start, a.time_at_stop)
                .cmp(&(b.stop, b.time_at_start, b.time_at_stop))
        });
        rides.dedup();
        rides
    };
    (collect(|a| a.first_mile), collect(|a| a.last_mile))
}

/// Drop itineraries whose ODM rides the whitelist did not confirm.
pub fn filter_confirmed(annotated: Vec<Annotated>, confirmed: &ConfirmedRides) -> Vec<Itinerary> {
    let before = annotated.len();
    let kept: Vec<Itinerary> = annotated
        .into_iter()
        .filter(|a| {
            a.first_mile.is_none_or(|r| confirmed.first_mile.contains(&r))
                && a.last_mile.is_none_or(|r| confirmed.last_mile.contains(&r))
        })
        .map(|a| a.itinerary)
        .collect();
    if kept.len() < before {
        debug!(dropped = before - kept.len(), "dropped unconfirmed itineraries");
    }
    kept
}

/// Merge scheduled-transit itineraries with direct ones.
///
/// Deduplicates across the two sources (scheduled results win on ties)
/// and sorts by arrival, then transfer count, then departure. The sort
/// is stable, preserving upstream order within equal keys.
pub fn merge(scheduled: Vec<Itinerary>, direct: Vec<Itinerary>) -> Vec<Itinerary> {
    let mut seen = HashSet::new();
    let mut merged: Vec<Itinerary> = scheduled
        .into_iter()
        .chain(direct)
        .filter(|i| seen.insert(i.signature()))
        .collect();
    merged.sort_by_key(|i| (i.end_time(), i.transfers(), i.start_time()));
    merged
}
