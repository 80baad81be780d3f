//! Per-request ODM working state.
//!
//! One value per trip request, created when planning starts and dropped
//! when the response is produced. It is deliberately owned by the
//! request's task rather than stored in any process-wide or thread-pinned
//! slot: sharing it across concurrent requests would leak one trip's
//! candidates into another's whitelist.

use crate::domain::{Capacities, DirectRide, LatLng, Ride};

/// Which event of the trip is fixed by the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fixed {
    /// Depart-after request: the departure is anchored.
    Departure,
    /// Arrive-by request: the arrival is anchored.
    Arrival,
}

/// The mutable working set of one trip request.
///
/// `first_mile`, `last_mile` and `direct` hold the current candidate
/// generation; the `prev_*` fields keep the previous generation so the
/// whitelist phase can reference exactly the rides the search actually
/// used while the blacklist-phase candidate set is still available for
/// diagnostics.
#[derive(Debug, Clone)]
pub struct OdmRequestState {
    pub from: LatLng,
    pub to: LatLng,
    pub fixed: Fixed,
    pub capacities: Capacities,

    pub first_mile: Vec<Ride>,
    pub last_mile: Vec<Ride>,
    pub direct: Vec<DirectRide>,

    pub prev_first_mile: Vec<Ride>,
    pub prev_last_mile: Vec<Ride>,
    pub prev_direct: Vec<DirectRide>,
}

impl OdmRequestState {
    pub fn new(from: LatLng, to: LatLng, fixed: Fixed, capacities: Capacities) -> Self {
        Self {
            from,
            to,
            fixed,
            capacities,
            first_mile: Vec::new(),
            last_mile: Vec::new(),
            direct: Vec::new(),
            prev_first_mile: Vec::new(),
            prev_last_mile: Vec::new(),
            prev_direct: Vec::new(),
        }
    }

    /// Install the next ride generation, moving the current one to `prev_*`.
    ///
    /// Called between the blacklist and whitelist phases with the rides
    /// actually referenced by produced itineraries.
    pub fn promote(
        &mut self,
        first_mile: Vec<Ride>,
        last_mile: Vec<Ride>,
        direct: Vec<DirectRide>,
    ) {
        self.prev_first_mile = std::mem::replace(&mut self.first_mile, first_mile);
        self.prev_last_mile = std::mem::replace(&mut self.last_mile, last_mile);
        self.prev_direct = std::mem::replace(&mut self.direct, direct);
    }

    /// Drop all on-demand candidates, e.g. after a broker failure.
    pub fn clear_candidates(&mut self) {
        self.first_mile.clear();
        self.last_mile.clear();
        self.direct.clear();
    }

    /// Total number of candidate events currently held.
    pub fn candidate_count(&self) -> usize {
        self.first_mile.len() + self.last_mile.len() + self.direct.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{StopId, UnixTime};

    fn state() -> OdmRequestState {
        OdmRequestState::new(
            LatLng::new(49.0, 8.4),
            LatLng::new(49.1, 8.5),
            Fixed::Departure,
            Capacities::from_request(false, false, None, None),
        )
    }

    fn ride(stop: u32, at_stop: i64, at_start: i64) -> Ride {
        Ride::new(
            StopId(stop),
            UnixTime::from_minutes(at_stop),
            UnixTime::from_minutes(at_start),
        )
    }

    #[test]
    fn promote_keeps_previous_generation() {
        let mut s = state();
        s.first_mile = vec![ride(1, 20, 0), ride(2, 30, 0)];
        s.direct = vec![DirectRide {
            dep: UnixTime::from_minutes(0),
            arr: UnixTime::from_minutes(25),
        }];

        let used = vec![ride(1, 20, 0)];
        s.promote(used.clone(), vec![], vec![]);

        assert_eq!(s.first_mile, used);
        assert_eq!(s.prev_first_mile.len(), 2);
        assert!(s.last_mile.is_empty());
        assert_eq!(s.prev_direct.len(), 1);
        assert!(s.direct.is_empty());
    }

    #[test]
    fn clear_candidates_leaves_prev_untouched() {
        let mut s = state();
        s.first_mile = vec![ride(1, 20, 0)];
        s.promote(vec![ride(1, 20, 0)], vec![], vec![]);
        s.clear_candidates();

        assert_eq!(s.candidate_count(), 0);
        assert_eq!(s.prev_first_mile.len(), 1);
    }
}
