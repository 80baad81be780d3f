//! Seams to the external collaborators.
//!
//! The road router and the scheduled-transit search are consumed through
//! these traits so the orchestrator can be exercised against mocks; the
//! real implementations live outside this crate.

use chrono::Duration;

use crate::domain::{Itinerary, LatLng, Offset, Ride, StopId, TimeInterval, TransportMode};
use crate::queries::Query;

/// Direction of an access search relative to the trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchDirection {
    /// From the location into the network (first mile).
    Forward,
    /// From the network to the location (last mile).
    Backward,
}

/// Failure of an upstream collaborator.
///
/// Unlike broker failures these are not recoverable: without the road
/// router or the transit search there is no baseline itinerary set.
#[derive(Debug, Clone, thiserror::Error)]
#[error("upstream failure: {message}")]
pub struct UpstreamError {
    pub message: String,
}

impl UpstreamError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Road-network router producing access offsets and direct route durations.
pub trait RoadRouter: Send + Sync {
    /// Offsets from/to `at` reaching nearby transit stops with the given
    /// mode, bounded by `max_duration`. An empty result is not an error.
    fn offsets(
        &self,
        at: &LatLng,
        direction: SearchDirection,
        mode: TransportMode,
        max_duration: Duration,
    ) -> Result<Vec<Offset>, UpstreamError>;

    /// Point-to-point route duration for the given mode, if a route
    /// exists.
    fn route_duration(
        &self,
        from: &LatLng,
        to: &LatLng,
        mode: TransportMode,
    ) -> Result<Option<Duration>, UpstreamError>;
}

/// The scheduled-transit search engine.
///
/// Treated as a pure function over its inputs plus the read-only
/// timetable and real-time state; safe to invoke concurrently.
pub trait TransitSearch: Send + Sync {
    /// Coordinates of a stop in the timetable.
    fn stop_position(&self, stop: StopId) -> Option<LatLng>;

    /// Enumerate concrete access/egress events for the given offsets
    /// within the interval, carrying both time anchors.
    fn access_rides(
        &self,
        direction: SearchDirection,
        interval: TimeInterval,
        offsets: &[Offset],
    ) -> Result<Vec<Ride>, UpstreamError>;

    /// Execute one query variant, returning ordered itineraries.
    fn search(&self, query: &Query) -> Result<Vec<Itinerary>, UpstreamError>;
}
