//! Itineraries returned by the scheduled-transit search.
//!
//! A leg is a tagged union over scheduled-transit rides and offset-backed
//! access legs; consumers match on it exhaustively. An ODM leg is an
//! offset-backed leg whose mode tag is the reserved ODM mode.

use chrono::Duration;

use super::location::{Location, StopId};
use super::offset::TransportMode;
use super::time::UnixTime;

/// A ride on a scheduled-transit trip.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitLeg {
    /// Trip identifier within the timetable (opaque to this subsystem).
    pub trip: u32,
    pub from: StopId,
    pub to: StopId,
    pub dep: UnixTime,
    pub arr: UnixTime,
}

/// An offset-backed leg: walk, bike, car, or ODM.
#[derive(Debug, Clone, PartialEq)]
pub struct OffsetLeg {
    pub mode: TransportMode,
    pub from: Location,
    pub to: Location,
    pub dep: UnixTime,
    pub arr: UnixTime,
}

impl OffsetLeg {
    pub fn duration(&self) -> Duration {
        self.arr - self.dep
    }
}

/// One leg of an itinerary.
#[derive(Debug, Clone, PartialEq)]
pub enum Leg {
    Transit(TransitLeg),
    Offset(OffsetLeg),
}

impl Leg {
    pub fn dep(&self) -> UnixTime {
        match self {
            Leg::Transit(l) => l.dep,
            Leg::Offset(l) => l.dep,
        }
    }

    pub fn arr(&self) -> UnixTime {
        match self {
            Leg::Transit(l) => l.arr,
            Leg::Offset(l) => l.arr,
        }
    }

    /// Whether this is an on-demand leg, identified solely by its mode tag.
    pub fn is_odm(&self) -> bool {
        match self {
            Leg::Offset(l) => l.mode == TransportMode::Odm,
            Leg::Transit(_) => false,
        }
    }
}

/// Deduplication key across search variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature {
    pub start: UnixTime,
    pub end: UnixTime,
    pub transfers: usize,
}

/// An ordered sequence of legs answering a trip request.
#[derive(Debug, Clone, PartialEq)]
pub struct Itinerary {
    pub legs: Vec<Leg>,
}

impl Itinerary {
    pub fn new(legs: Vec<Leg>) -> Self {
        debug_assert!(!legs.is_empty(), "itinerary without legs");
        Self { legs }
    }

    pub fn start_time(&self) -> UnixTime {
        self.legs.first().map(Leg::dep).expect("itinerary without legs")
    }

    pub fn end_time(&self) -> UnixTime {
        self.legs.last().map(Leg::arr).expect("itinerary without legs")
    }

    /// Number of transfers between scheduled-transit legs.
    pub fn transfers(&self) -> usize {
        let transit_legs = self
            .legs
            .iter()
            .filter(|l| matches!(l, Leg::Transit(_)))
            .count();
        transit_legs.saturating_sub(1)
    }

    pub fn signature(&self) -> Signature {
        Signature {
            start: self.start_time(),
            end: self.end_time(),
            transfers: self.transfers(),
        }
    }

    /// A single offset-backed ODM leg and nothing else.
    pub fn is_direct_odm(&self) -> bool {
        self.legs.len() == 1 && self.legs[0].is_odm()
    }

    /// Whether any leg is on-demand.
    pub fn uses_odm(&self) -> bool {
        self.legs.iter().any(Leg::is_odm)
    }
}
