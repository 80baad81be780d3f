//! Per-request planning sequence.
//!
//! One trip request runs: candidate generation, the blacklist exchange,
//! offset encoding, the nine search variants, annotation and repair, the
//! whitelist exchange, and the final merge. The broker round trips are
//! the only suspension points; the nine searches are independent and run
//! in parallel on blocking workers. Dropping the returned future
//! abandons any in-flight broker exchange and pending searches without
//! affecting other requests.

use std::sync::Arc;

use chrono::Duration;
use futures::future::join_all;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::broker::{Broker, BrokerError, ConfirmedRides};
use crate::config::OdmConfig;
use crate::domain::{
    Capacities, DirectRide, Itinerary, LatLng, Leg, Location, OffsetLeg, TimeInterval,
    TransportMode, UnixTime,
};
use crate::encoder::{RideAnchor, encode_td_offsets, split_by_ride_time};
use crate::external::{RoadRouter, SearchDirection, TransitSearch, UpstreamError};
use crate::generator;
use crate::merge;
use crate::queries::{MatchMode, Query, QueryFactory, QueryInvariants, TransferTimeSettings};
use crate::state::{Fixed, OdmRequestState};

/// Default bound on one broker round trip.
const DEFAULT_BROKER_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

/// One trip request.
#[derive(Debug, Clone)]
pub struct PlanRequest {
    pub from: LatLng,
    pub to: LatLng,
    /// Requested departure (or arrival, if `arrive_by`) time.
    pub time: UnixTime,
    pub arrive_by: bool,
    /// Length of the initial search interval.
    pub window: Duration,

    pub wheelchair: bool,
    pub bike_transport: bool,
    pub passengers: Option<u8>,
    pub luggage: Option<u8>,

    pub use_first_mile: bool,
    pub use_last_mile: bool,
    pub use_direct: bool,

    pub max_transfers: u8,
    pub max_travel_time: Duration,
    pub min_connection_count: usize,
    pub extend_interval_earlier: bool,
    pub extend_interval_later: bool,
}

impl PlanRequest {
    pub fn new(from: LatLng, to: LatLng, time: UnixTime) -> Self {
        Self {
            from,
            to,
            time,
            arrive_by: false,
            window: Duration::hours(2),
            wheelchair: false,
            bike_transport: false,
            passengers: None,
            luggage: None,
            use_first_mile: true,
            use_last_mile: true,
            use_direct: true,
            max_transfers: 7,
            max_travel_time: Duration::hours(24),
            min_connection_count: 0,
            extend_interval_earlier: false,
            extend_interval_later: false,
        }
    }

    /// Anchor the request on the arrival instead of the departure.
    pub fn with_arrive_by(mut self) -> Self {
        self.arrive_by = true;
        self
    }

    fn fixed(&self) -> Fixed {
        if self.arrive_by {
            Fixed::Arrival
        } else {
            Fixed::Departure
        }
    }

    fn capacities(&self) -> Capacities {
        Capacities::from_request(
            self.wheelchair,
            self.bike_transport,
            self.passengers,
            self.luggage,
        )
    }
}

/// Correlation metadata returned alongside the itineraries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanStats {
    pub candidates_generated: usize,
    pub candidates_after_blacklist: usize,
    pub searches_run: usize,
    pub itineraries_found: usize,
    pub odm_itineraries_kept: usize,
    /// Set when a broker exchange failed and the request degraded to
    /// scheduled transit only.
    pub broker_degraded: bool,
}

/// The final merged itinerary list.
#[derive(Debug, Clone)]
pub struct PlanResponse {
    pub itineraries: Vec<Itinerary>,
    pub stats: PlanStats,
}

/// Failure of a trip request as a whole.
///
/// Broker failures never surface here; the request degrades to
/// scheduled transit and the degradation shows up in [`PlanStats`].
#[derive(Debug, Error)]
pub enum PlanError {
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("search task failed: {0}")]
    SearchTask(#[from] tokio::task::JoinError),
}

/// Sequences one trip request end to end.
pub struct Orchestrator<R, T, B> {
    router: Arc<R>,
    transit: Arc<T>,
    broker: B,
    config: OdmConfig,
    broker_timeout: std::time::Duration,
}

impl<R, T, B> Orchestrator<R, T, B>
where
    R: RoadRouter + 'static,
    T: TransitSearch + 'static,
    B: Broker,
{
    pub fn new(router: Arc<R>, transit: Arc<T>, broker: B, config: OdmConfig) -> Self {
        Self {
            router,
            transit,
            broker,
            config,
            broker_timeout: DEFAULT_BROKER_TIMEOUT,
        }
    }

    /// Bound each broker round trip; on expiry the exchange is treated
    /// as a protocol failure and the request degrades.
    pub fn with_broker_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.broker_timeout = timeout;
        self
    }

    /// Plan one trip.
    pub async fn plan(&self, request: PlanRequest) -> Result<PlanResponse, PlanError> {
        let mut stats = PlanStats::default();
        let fixed = request.fixed();

        // The initiating side keeps the requested interval; the other
        // side is extended by the horizon so late egress events exist.
        let base = match fixed {
            Fixed::Departure => TimeInterval {
                from: request.time,
                to: request.time + request.window,
            },
            Fixed::Arrival => TimeInterval {
                from: request.time - request.window,
                to: request.time,
            },
        };
        let extended = match fixed {
            Fixed::Departure => base.extend_later(self.config.horizon()),
            Fixed::Arrival => base.extend_earlier(self.config.horizon()),
        };
        let (first_mile_interval, last_mile_interval) = match fixed {
            Fixed::Departure => (base, extended),
            Fixed::Arrival => (extended, base),
        };

        let mut state = OdmRequestState::new(
            request.from,
            request.to,
            fixed,
            request.capacities(),
        );

        // The direct drive duration tightens the access-offset cap: an
        // access ride longer than driving straight to the destination
        // cannot beat the direct ride.
        let direct_duration = generator::direct_duration(
            self.router.as_ref(),
            &self.config,
            &request.from,
            &request.to,
        )?;
        let max_offset = direct_duration.map_or(self.config.max_ride(), |d| {
            d.min(self.config.max_ride())
        });

        if request.use_first_mile {
            state.first_mile = generator::mile_rides(
                self.router.as_ref(),
                self.transit.as_ref(),
                &self.config,
                &request.from,
                SearchDirection::Forward,
                first_mile_interval,
                max_offset,
            )?;
        }
        if request.use_last_mile {
            state.last_mile = generator::mile_rides(
                self.router.as_ref(),
                self.transit.as_ref(),
                &self.config,
                &request.to,
                SearchDirection::Backward,
                last_mile_interval,
                max_offset,
            )?;
        }
        if request.use_direct {
            // Direct rides span the arrival-side interval, so depart-after
            // requests get direct departures across the full horizon.
            state.direct = generator::direct_rides(
                &self.config,
                direct_duration,
                fixed,
                last_mile_interval,
            );
        }
        stats.candidates_generated = state.candidate_count();

        let start_walk = self.router.offsets(
            &request.from,
            SearchDirection::Forward,
            TransportMode::Walk,
            self.config.max_walk(),
        )?;
        let dest_walk = self.router.offsets(
            &request.to,
            SearchDirection::Backward,
            TransportMode::Walk,
            self.config.max_walk(),
        )?;

        if state.candidate_count() > 0 {
            match self.blacklist_round_trip(&state).await {
                Ok(response) => {
                    crate::broker::apply_blacklist(
                        &mut state,
                        &response,
                        self.config.transfer_buffer(),
                    );
                }
                Err(err) => {
                    warn!(error = %err, "blacklist exchange failed, dropping ODM candidates");
                    state.clear_candidates();
                    stats.broker_degraded = true;
                }
            }
        }
        stats.candidates_after_blacklist = state.candidate_count();

        let fastest_direct = state
            .direct
            .iter()
            .map(|d| d.arr - d.dep)
            .min();

        let (start_anchor, dest_anchor) = if request.arrive_by {
            (RideAnchor::TimeAtStop, RideAnchor::TimeAtStart)
        } else {
            (RideAnchor::TimeAtStart, RideAnchor::TimeAtStop)
        };
        let start_buckets = split_by_ride_time(state.first_mile.clone());
        let dest_buckets = split_by_ride_time(state.last_mile.clone());

        let factory = QueryFactory {
            invariants: QueryInvariants {
                interval: base,
                arrive_by: request.arrive_by,
                start_match_mode: MatchMode::Intermodal,
                dest_match_mode: MatchMode::Intermodal,
                use_start_footpaths: true,
                max_transfers: request.max_transfers,
                max_travel_time: request.max_travel_time,
                min_connection_count: request.min_connection_count,
                extend_interval_earlier: request.extend_interval_earlier,
                extend_interval_later: request.extend_interval_later,
                allowed_classes: u32::MAX,
                require_bike_transport: request.bike_transport,
                transfer_time_settings: TransferTimeSettings::default(),
                via_stops: Vec::new(),
                fastest_direct,
            },
            start_walk,
            dest_walk,
            odm_start_short: encode_td_offsets(&start_buckets.short, start_anchor),
            odm_start_long: encode_td_offsets(&start_buckets.long, start_anchor),
            odm_dest_short: encode_td_offsets(&dest_buckets.short, dest_anchor),
            odm_dest_long: encode_td_offsets(&dest_buckets.long, dest_anchor),
        };

        // Variants with nothing attached to one side cannot produce
        // anything; only the baseline walk-walk search always runs.
        let queries: Vec<Query> = factory
            .all()
            .into_iter()
            .enumerate()
            .filter(|(i, q)| {
                *i == 0
                    || (!(q.start.is_empty() && q.td_start.is_empty())
                        && !(q.dest.is_empty() && q.td_dest.is_empty()))
            })
            .map(|(_, q)| q)
            .collect();
        stats.searches_run = queries.len();

        let tasks: Vec<_> = queries
            .into_iter()
            .map(|query| {
                let transit = Arc::clone(&self.transit);
                tokio::task::spawn_blocking(move || transit.search(&query))
            })
            .collect();

        let mut raw = Vec::new();
        for result in join_all(tasks).await {
            raw.extend(result??);
        }
        stats.itineraries_found = raw.len();
        debug!(
            itineraries = raw.len(),
            searches = stats.searches_run,
            "search variants complete"
        );

        // Pair itineraries with their rides while leg times still equal
        // the ride anchors, then repair and deduplicate.
        let mut annotated: Vec<merge::Annotated> = raw
            .into_iter()
            .map(|itinerary| merge::annotate(itinerary, &state))
            .collect();
        for a in &mut annotated {
            merge::repair_transfer_buffer(&mut a.itinerary, self.config.transfer_buffer());
        }
        let annotated = merge::dedup(annotated);

        let (used_first, used_last) = merge::collect_used_rides(&annotated);
        let used_direct = state.direct.clone();
        state.promote(used_first, used_last, used_direct);

        let confirmed = if stats.broker_degraded || state.candidate_count() == 0 {
            ConfirmedRides::default()
        } else {
            match self.whitelist_round_trip(&state).await {
                Ok(response) => crate::broker::confirmed_rides(&state, &response),
                Err(err) => {
                    warn!(error = %err, "whitelist exchange failed, dropping ODM itineraries");
                    stats.broker_degraded = true;
                    ConfirmedRides::default()
                }
            }
        };

        let scheduled = merge::filter_confirmed(annotated, &confirmed);
        let direct = self.direct_itineraries(&request, &state, &confirmed);

        let itineraries = merge::merge(scheduled, direct);
        stats.odm_itineraries_kept = itineraries.iter().filter(|i| i.uses_odm()).count();

        info!(
            itineraries = itineraries.len(),
            odm = stats.odm_itineraries_kept,
            degraded = stats.broker_degraded,
            "plan complete"
        );
        Ok(PlanResponse { itineraries, stats })
    }

    async fn blacklist_round_trip(
        &self,
        state: &OdmRequestState,
    ) -> Result<crate::broker::BlacklistResponse, BrokerError> {
        let transit = Arc::clone(&self.transit);
        let request = crate::broker::build_request(state, self.config.transfer_buffer(), |stop| {
            transit.stop_position(stop)
        });
        timeout(self.broker_timeout, self.broker.blacklist(&request))
            .await
            .unwrap_or(Err(BrokerError::Timeout))
    }

    async fn whitelist_round_trip(
        &self,
        state: &OdmRequestState,
    ) -> Result<crate::broker::WhitelistResponse, BrokerError> {
        let transit = Arc::clone(&self.transit);
        let request = crate::broker::build_request(state, self.config.transfer_buffer(), |stop| {
            transit.stop_position(stop)
        });
        timeout(self.broker_timeout, self.broker.whitelist(&request))
            .await
            .unwrap_or(Err(BrokerError::Timeout))
    }

    fn direct_itineraries(
        &self,
        request: &PlanRequest,
        state: &OdmRequestState,
        confirmed: &ConfirmedRides,
    ) -> Vec<Itinerary> {
        if !request.use_direct {
            return Vec::new();
        }
        let mut rides: Vec<&DirectRide> = state
            .direct
            .iter()
            .filter(|d| confirmed.direct.contains(d))
            .collect();
        rides.sort_by_key(|d| d.dep);
        rides
            .into_iter()
            .map(|d| {
                Itinerary::new(vec![Leg::Offset(OffsetLeg {
                    mode: TransportMode::Odm,
                    from: Location::Coordinate(request.from),
                    to: Location::Coordinate(request.to),
                    dep: d.dep,
                    arr: d.arr,
                })])
            })
            .collect()
    }
}
