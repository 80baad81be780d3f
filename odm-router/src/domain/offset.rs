//! Offsets: fixed-cost access edges into the scheduled-transit network.

use chrono::Duration;

use super::location::StopId;
use super::time::UnixTime;

/// Transport mode tag carried on offsets and offset-backed legs.
///
/// `Odm` is the reserved on-demand mobility mode; a leg is an ODM leg
/// exactly when it is offset-backed and carries this tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportMode {
    Walk,
    Bike,
    Car,
    Odm,
}

/// A fixed-cost edge from/to a network stop, produced by the road router
/// or synthesized for ODM candidates.
///
/// For ODM offsets the duration includes the fixed transfer buffer added
/// during candidate generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Offset {
    pub target: StopId,
    pub duration: Duration,
    pub mode: TransportMode,
}

impl Offset {
    pub fn new(target: StopId, duration: Duration, mode: TransportMode) -> Self {
        Self {
            target,
            duration,
            mode,
        }
    }
}

/// Sentinel duration marking a time-dependent offset entry as unusable.
///
/// The scheduled-transit search treats an entry with this duration as
/// "no connection from this instant onward".
pub const INFEASIBLE: Duration = Duration::MAX;

/// One step of a time-dependent offset profile.
///
/// The profile is a step function over departure time: an entry is in
/// effect from `valid_from` until the next entry's `valid_from`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TdOffset {
    pub valid_from: UnixTime,
    pub duration: Duration,
    pub mode: TransportMode,
}

impl TdOffset {
    /// Whether this entry marks the offset unusable.
    pub fn is_infeasible(&self) -> bool {
        self.duration == INFEASIBLE
    }
}
