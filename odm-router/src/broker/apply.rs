//! Applying broker answers to the candidate state.
//!
//! Blacklist answers narrow the candidate sets in place; whitelist
//! answers are turned into confirmation sets the merge step filters by.
//! Answers for candidates that were never sent are a protocol violation
//! and are logged and ignored; candidates left unanswered are treated as
//! rejected.

use std::collections::HashSet;

use chrono::Duration;
use tracing::{debug, warn};

use super::types::{
    BlacklistResponse, WhichMile, WhitelistResponse, WindowDto, broker_time, group_by_stop,
};
use crate::domain::{DirectRide, Ride, UnixTime};
use crate::state::{Fixed, OdmRequestState};

fn in_any_window(time: UnixTime, windows: &[WindowDto]) -> bool {
    windows.iter().any(|w| w.to_window().contains(time))
}

fn narrow_mile(
    rides: &mut Vec<Ride>,
    answers: &[Vec<WindowDto>],
    which: WhichMile,
    buffer: Duration,
) {
    let groups = group_by_stop(rides);
    if answers.len() != groups.len() {
        warn!(
            sent = groups.len(),
            answered = answers.len(),
            "blacklist answer count does not match sent stop groups"
        );
    }

    let mut kept = Vec::new();
    for (i, (_, group)) in groups.into_iter().enumerate() {
        let Some(windows) = answers.get(i) else {
            continue;
        };
        kept.extend(
            group
                .iter()
                .filter(|r| in_any_window(broker_time(r, which, buffer), windows))
                .copied(),
        );
    }
    *rides = kept;
}

/// Narrow the candidate sets to the broker's serviceable windows.
///
/// Each candidate is kept only if the instant sent to the broker lies in
/// one of the windows returned for its stop group. Direct rides are
/// checked on their fixed event.
pub fn apply_blacklist(state: &mut OdmRequestState, response: &BlacklistResponse, buffer: Duration) {
    let before = state.candidate_count();

    narrow_mile(&mut state.first_mile, &response.start, WhichMile::FirstMile, buffer);
    narrow_mile(&mut state.last_mile, &response.target, WhichMile::LastMile, buffer);

    let fixed = state.fixed;
    state.direct.retain(|d| {
        let anchor = match fixed {
            Fixed::Departure => d.dep,
            Fixed::Arrival => d.arr,
        };
        in_any_window(anchor, &response.direct)
    });

    debug!(
        before,
        after = state.candidate_count(),
        "blacklist narrowed candidates"
    );
}

/// Rides the whitelist exchange confirmed.
#[derive(Debug, Default)]
pub struct ConfirmedRides {
    pub first_mile: HashSet<Ride>,
    pub last_mile: HashSet<Ride>,
    pub direct: HashSet<DirectRide>,
}

impl ConfirmedRides {
    pub fn is_empty(&self) -> bool {
        self.first_mile.is_empty() && self.last_mile.is_empty() && self.direct.is_empty()
    }
}

fn confirm_mile(rides: &[Ride], answers: &[Vec<bool>]) -> HashSet<Ride> {
    let groups = group_by_stop(rides);
    if answers.len() != groups.len() {
        warn!(
            sent = groups.len(),
            answered = answers.len(),
            "whitelist answer count does not match sent stop groups"
        );
    }

    let mut confirmed = HashSet::new();
    for (i, (_, group)) in groups.into_iter().enumerate() {
        let Some(flags) = answers.get(i) else {
            continue;
        };
        if flags.len() != group.len() {
            warn!(
                group = i,
                sent = group.len(),
                answered = flags.len(),
                "whitelist group answer length does not match sent rides"
            );
        }
        for (ride, &ok) in group.iter().zip(flags) {
            if ok {
                confirmed.insert(*ride);
            }
        }
    }
    confirmed
}

/// Extract the confirmation sets from a whitelist answer.
///
/// Answers mirror the request order; booleans beyond the sent rides are
/// ignored, unanswered rides stay unconfirmed.
pub fn confirmed_rides(state: &OdmRequestState, response: &WhitelistResponse) -> ConfirmedRides {
    if response.direct.len() != state.direct.len() {
        warn!(
            sent = state.direct.len(),
            answered = response.direct.len(),
            "whitelist direct answer count does not match sent rides"
        );
    }

    ConfirmedRides {
        first_mile: confirm_mile(&state.first_mile, &response.start),
        last_mile: confirm_mile(&state.last_mile, &response.target),
        direct: state
            .direct
            .iter()
            .zip(&response.direct)
            .filter_map(|(d, &ok)| ok.then_some(*d))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Capacities, LatLng, StopId};

    fn t(m: i64) -> UnixTime {
        UnixTime::from_minutes(m)
    }

    fn ride(stop: u32, at_stop: i64, at_start: i64) -> Ride {
        Ride::new(StopId(stop), t(at_stop), t(at_start))
    }

    fn window(from: i64, to: i64) -> WindowDto {
        WindowDto {
            start_time: from * 60_000,
            end_time: to * 60_000,
        }
    }

    fn state() -> OdmRequestState {
        OdmRequestState::new(
            LatLng::new(49.0, 8.4),
            LatLng::new(49.2, 8.6),
            Fixed::Departure,
            Capacities::from_request(false, false, None, None),
        )
    }

    fn buffer() -> Duration {
        Duration::minutes(5)
    }

    #[test]
    fn blacklist_keeps_rides_inside_windows() {
        let mut s = state();
        // broker times: 15, 75 (stop 1) and 25 (stop 2)
        s.first_mile = vec![ride(1, 20, 0), ride(1, 80, 60), ride(2, 30, 10)];

        let resp = BlacklistResponse {
            start: vec![vec![window(10, 30)], vec![]],
            target: vec![],
            direct: vec![],
        };
        apply_blacklist(&mut s, &resp, buffer());

        assert_eq!(s.first_mile, vec![ride(1, 20, 0)]);
    }

    #[test]
    fn blacklist_never_adds_candidates() {
        let mut s = state();
        s.first_mile = vec![ride(1, 20, 0)];

        // a window for a stop group that was never sent
        let resp = BlacklistResponse {
            start: vec![vec![window(0, 100)], vec![window(0, 100)]],
            target: vec![vec![window(0, 100)]],
            direct: vec![window(0, 100)],
        };
        apply_blacklist(&mut s, &resp, buffer());

        assert_eq!(s.first_mile.len(), 1);
        assert!(s.last_mile.is_empty());
        assert!(s.direct.is_empty());
    }

    #[test]
    fn unanswered_groups_are_rejected() {
        let mut s = state();
        s.first_mile = vec![ride(1, 20, 0), ride(2, 30, 10)];

        let resp = BlacklistResponse {
            start: vec![vec![window(0, 100)]],
            target: vec![],
            direct: vec![],
        };
        apply_blacklist(&mut s, &resp, buffer());

        assert_eq!(s.first_mile, vec![ride(1, 20, 0)]);
    }

    #[test]
    fn direct_rides_checked_on_fixed_event() {
        let mut s = state();
        s.direct = vec![
            DirectRide { dep: t(10), arr: t(50) },
            DirectRide { dep: t(70), arr: t(110) },
        ];

        let resp = BlacklistResponse {
            start: vec![],
            target: vec![],
            direct: vec![window(0, 60)],
        };
        apply_blacklist(&mut s, &resp, buffer());
        assert_eq!(s.direct, vec![DirectRide { dep: t(10), arr: t(50) }]);

        // arrive-by anchors on the arrival instead
        let mut s = state();
        s.fixed = Fixed::Arrival;
        s.direct = vec![
            DirectRide { dep: t(10), arr: t(50) },
            DirectRide { dep: t(70), arr: t(110) },
        ];
        apply_blacklist(&mut s, &resp, buffer());
        assert_eq!(s.direct, vec![DirectRide { dep: t(10), arr: t(50) }]);
    }

    #[test]
    fn whitelist_confirms_by_position() {
        let mut s = state();
        s.first_mile = vec![ride(1, 20, 0), ride(1, 80, 60), ride(2, 30, 10)];
        s.direct = vec![DirectRide { dep: t(0), arr: t(45) }];

        let resp = WhitelistResponse {
            start: vec![vec![true, false], vec![true]],
            target: vec![],
            direct: vec![false],
        };
        let confirmed = confirmed_rides(&s, &resp);

        assert!(confirmed.first_mile.contains(&ride(1, 20, 0)));
        assert!(!confirmed.first_mile.contains(&ride(1, 80, 60)));
        assert!(confirmed.first_mile.contains(&ride(2, 30, 10)));
        assert!(confirmed.direct.is_empty());
    }

    #[test]
    fn whitelist_extra_answers_are_ignored() {
        let mut s = state();
        s.first_mile = vec![ride(1, 20, 0)];

        let resp = WhitelistResponse {
            start: vec![vec![true, true, true], vec![true]],
            target: vec![vec![true]],
            direct: vec![true, true],
        };
        let confirmed = confirmed_rides(&s, &resp);

        assert_eq!(confirmed.first_mile.len(), 1);
        assert!(confirmed.last_mile.is_empty());
        assert!(confirmed.direct.is_empty());
    }
}
