//! Locations: fixed transit stops and free coordinates.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a stop in the scheduled-transit network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StopId(pub u32);

impl fmt::Display for StopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stop#{}", self.0)
    }
}

/// A WGS84 coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Either a fixed stop in the scheduled-transit network or a free
/// coordinate to be resolved by the road router.
///
/// Immutable for the lifetime of a trip request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Location {
    Stop(StopId),
    Coordinate(LatLng),
}

impl Location {
    /// True for free coordinates that need road-network access legs.
    pub fn is_intermodal(&self) -> bool {
        matches!(self, Location::Coordinate(_))
    }

    /// The coordinate, if this is a free location.
    pub fn coordinate(&self) -> Option<LatLng> {
        match self {
            Location::Coordinate(pos) => Some(*pos),
            Location::Stop(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intermodal_detection() {
        assert!(Location::Coordinate(LatLng::new(49.0, 8.4)).is_intermodal());
        assert!(!Location::Stop(StopId(3)).is_intermodal());
    }

    #[test]
    fn coordinate_accessor() {
        let pos = LatLng::new(49.0, 8.4);
        assert_eq!(Location::Coordinate(pos).coordinate(), Some(pos));
        assert_eq!(Location::Stop(StopId(0)).coordinate(), None);
    }
}
