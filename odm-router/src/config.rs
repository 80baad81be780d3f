//! Configuration for the ODM orchestration layer.

use chrono::Duration;

use crate::domain::LatLng;

/// Geographic bounds of the ODM operator's service area.
///
/// Candidates whose outside location or target stop fall outside these
/// bounds are discarded before they reach the broker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ServiceArea {
    pub min_lat: f64,
    pub min_lng: f64,
    pub max_lat: f64,
    pub max_lng: f64,
}

impl ServiceArea {
    pub fn contains(&self, pos: &LatLng) -> bool {
        self.min_lat <= pos.lat
            && pos.lat <= self.max_lat
            && self.min_lng <= pos.lng
            && pos.lng <= self.max_lng
    }
}

/// Tuning knobs for candidate generation and itinerary repair.
#[derive(Debug, Clone)]
pub struct OdmConfig {
    /// Fixed wait/boarding overhead added to every ODM access offset
    /// and removed again during itinerary repair (minutes).
    pub transfer_buffer_mins: i64,

    /// Upper bound on a single ODM ride, access or direct (minutes).
    pub max_ride_mins: i64,

    /// Spacing between generated direct ODM rides (minutes).
    pub direct_cadence_mins: i64,

    /// How far the non-initiating side of the search interval is
    /// extended (hours).
    pub horizon_hours: i64,

    /// Maximum walk access/egress duration for the baseline variants
    /// (minutes).
    pub max_walk_mins: i64,

    /// Service area of the ODM operator; `None` disables the filter.
    pub service_area: Option<ServiceArea>,
}

impl OdmConfig {
    pub fn transfer_buffer(&self) -> Duration {
        Duration::minutes(self.transfer_buffer_mins)
    }

    pub fn max_ride(&self) -> Duration {
        Duration::minutes(self.max_ride_mins)
    }

    pub fn direct_cadence(&self) -> Duration {
        Duration::minutes(self.direct_cadence_mins)
    }

    pub fn horizon(&self) -> Duration {
        Duration::hours(self.horizon_hours)
    }

    pub fn max_walk(&self) -> Duration {
        Duration::minutes(self.max_walk_mins)
    }
}

impl Default for OdmConfig {
    fn default() -> Self {
        Self {
            transfer_buffer_mins: 5,
            max_ride_mins: 60,
            direct_cadence_mins: 60,
            horizon_hours: 24,
            max_walk_mins: 30,
            service_area: None,
        }
    }
}
