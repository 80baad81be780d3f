//! Query variants for the scheduled-transit search.
//!
//! One trip request fans out into nine searches: the cartesian product of
//! {walk, short ODM, long ODM} access on the start side and the
//! destination side. All nine share one set of search invariants and
//! differ only in which offset sets are attached to each anchor.

use std::collections::HashMap;

use chrono::Duration;

use crate::domain::{Offset, StopId, TdOffset, TimeInterval};

/// Time-dependent offsets grouped by stop.
pub type TdOffsetMap = HashMap<StopId, Vec<TdOffset>>;

/// How a search anchor matches timetable locations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Free coordinate reached via offsets.
    Intermodal,
    /// A stop and everything the timetable treats as equivalent.
    Equivalent,
    /// Exactly the given stop.
    Exact,
}

/// Transfer time adjustments applied uniformly to a search.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferTimeSettings {
    pub min_transfer_time: Duration,
    pub additional_time: Duration,
    pub factor: f32,
}

impl Default for TransferTimeSettings {
    fn default() -> Self {
        Self {
            min_transfer_time: Duration::zero(),
            additional_time: Duration::zero(),
            factor: 1.0,
        }
    }
}

/// A stop the itinerary must pass through, with a minimum stay.
#[derive(Debug, Clone, PartialEq)]
pub struct ViaStop {
    pub stop: StopId,
    pub min_stay: Duration,
}

/// Search parameters shared by all nine variants of one trip request.
#[derive(Debug, Clone)]
pub struct QueryInvariants {
    pub interval: TimeInterval,
    pub arrive_by: bool,
    pub start_match_mode: MatchMode,
    pub dest_match_mode: MatchMode,
    pub use_start_footpaths: bool,
    pub max_transfers: u8,
    pub max_travel_time: Duration,
    pub min_connection_count: usize,
    pub extend_interval_earlier: bool,
    pub extend_interval_later: bool,
    /// Bitmask of allowed transit classes.
    pub allowed_classes: u32,
    pub require_bike_transport: bool,
    pub transfer_time_settings: TransferTimeSettings,
    pub via_stops: Vec<ViaStop>,
    /// Duration of the fastest known direct connection, used by the
    /// search as a pruning bound.
    pub fastest_direct: Option<Duration>,
}

/// One fully assembled search invocation.
#[derive(Debug, Clone)]
pub struct Query {
    pub invariants: QueryInvariants,
    pub start: Vec<Offset>,
    pub dest: Vec<Offset>,
    pub td_start: TdOffsetMap,
    pub td_dest: TdOffsetMap,
}

/// Builds the 3x3 family of search variants.
///
/// Offsets are attached per side: the walk variants use plain offsets,
/// the ODM variants attach the short/long time-dependent offset sets
/// produced by the encoder.
#[derive(Debug, Clone)]
pub struct QueryFactory {
    pub invariants: QueryInvariants,

    pub start_walk: Vec<Offset>,
    pub dest_walk: Vec<Offset>,

    pub odm_start_short: TdOffsetMap,
    pub odm_start_long: TdOffsetMap,
    pub odm_dest_short: TdOffsetMap,
    pub odm_dest_long: TdOffsetMap,
}

impl QueryFactory {
    /// A factory with the given invariants and nothing attached yet.
    pub fn new(invariants: QueryInvariants) -> Self {
        Self {
            invariants,
            start_walk: Vec::new(),
            dest_walk: Vec::new(),
            odm_start_short: TdOffsetMap::new(),
            odm_start_long: TdOffsetMap::new(),
            odm_dest_short: TdOffsetMap::new(),
            odm_dest_long: TdOffsetMap::new(),
        }
    }

    fn make(
        &self,
        start: Vec<Offset>,
        td_start: TdOffsetMap,
        dest: Vec<Offset>,
        td_dest: TdOffsetMap,
    ) -> Query {
        Query {
            invariants: self.invariants.clone(),
            start,
            dest,
            td_start,
            td_dest,
        }
    }

    pub fn walk_walk(&self) -> Query {
        self.make(
            self.start_walk.clone(),
            TdOffsetMap::new(),
            self.dest_walk.clone(),
            TdOffsetMap::new(),
        )
    }

    pub fn walk_short(&self) -> Query {
        self.make(
            self.start_walk.clone(),
            TdOffsetMap::new(),
            Vec::new(),
            self.odm_dest_short.clone(),
        )
    }

    pub fn walk_long(&self) -> Query {
        self.make(
            self.start_walk.clone(),
            TdOffsetMap::new(),
            Vec::new(),
            self.odm_dest_long.clone(),
        )
    }

    pub fn short_walk(&self) -> Query {
        self.make(
            Vec::new(),
            self.odm_start_short.clone(),
            self.dest_walk.clone(),
            TdOffsetMap::new(),
        )
    }

    pub fn long_walk(&self) -> Query {
        self.make(
            Vec::new(),
            self.odm_start_long.clone(),
            self.dest_walk.clone(),
            TdOffsetMap::new(),
        )
    }

    pub fn short_short(&self) -> Query {
        self.make(
            Vec::new(),
            self.odm_start_short.clone(),
            Vec::new(),
            self.odm_dest_short.clone(),
        )
    }

    pub fn short_long(&self) -> Query {
        self.make(
            Vec::new(),
            self.odm_start_short.clone(),
            Vec::new(),
            self.odm_dest_long.clone(),
        )
    }

    pub fn long_short(&self) -> Query {
        self.make(
            Vec::new(),
            self.odm_start_long.clone(),
            Vec::new(),
            self.odm_dest_short.clone(),
        )
    }

    pub fn long_long(&self) -> Query {
        self.make(
            Vec::new(),
            self.odm_start_long.clone(),
            Vec::new(),
            self.odm_dest_long.clone(),
        )
    }

    /// All nine variants in a fixed order, walk-walk first.
    pub fn all(&self) -> Vec<Query> {
        vec![
            self.walk_walk(),
            self.walk_short(),
            self.walk_long(),
            self.short_walk(),
            self.long_walk(),
            self.short_short(),
            self.short_long(),
            self.long_short(),
            self.long_long(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{TransportMode, UnixTime};

    fn invariants() -> QueryInvariants {
        QueryInvariants {
            interval: TimeInterval::new(UnixTime::from_minutes(0), UnixTime::from_minutes(120)),
            arrive_by: false,
            start_match_mode: MatchMode::Intermodal,
            dest_match_mode: MatchMode::Intermodal,
            use_start_footpaths: true,
            max_transfers: 6,
            max_travel_time: Duration::hours(8),
            min_connection_count: 3,
            extend_interval_earlier: true,
            extend_interval_later: true,
            allowed_classes: u32::MAX,
            require_bike_transport: false,
            transfer_time_settings: TransferTimeSettings::default(),
            via_stops: Vec::new(),
            fastest_direct: None,
        }
    }

    fn factory() -> QueryFactory {
        let mut f = QueryFactory::new(invariants());
        f.start_walk = vec![Offset::new(
            StopId(1),
            Duration::minutes(5),
            TransportMode::Walk,
        )];
        f.dest_walk = vec![Offset::new(
            StopId(2),
            Duration::minutes(7),
            TransportMode::Walk,
        )];
        let td = |stop: u32, mins: i64| {
            let mut m = TdOffsetMap::new();
            m.insert(
                StopId(stop),
                vec![TdOffset {
                    valid_from: UnixTime::from_minutes(mins),
                    duration: Duration::minutes(10),
                    mode: TransportMode::Odm,
                }],
            );
            m
        };
        f.odm_start_short = td(3, 10);
        f.odm_start_long = td(4, 20);
        f.odm_dest_short = td(5, 30);
        f.odm_dest_long = td(6, 40);
        f
    }

    #[test]
    fn nine_variants() {
        assert_eq!(factory().all().len(), 9);
    }

    #[test]
    fn variants_share_invariants() {
        let f = factory();
        let queries = f.all();
        for q in &queries {
            assert_eq!(q.invariants.max_transfers, 6);
            assert_eq!(q.invariants.min_connection_count, 3);
            assert_eq!(q.invariants.interval, f.invariants.interval);
        }
    }

    #[test]
    fn walk_walk_has_no_odm_offsets() {
        let q = factory().walk_walk();
        assert!(q.td_start.is_empty());
        assert!(q.td_dest.is_empty());
        assert_eq!(q.start.len(), 1);
        assert_eq!(q.dest.len(), 1);
    }

    #[test]
    fn odm_variants_attach_the_right_sets() {
        let f = factory();

        let q = f.short_long();
        assert!(q.start.is_empty());
        assert!(q.dest.is_empty());
        assert!(q.td_start.contains_key(&StopId(3)));
        assert!(q.td_dest.contains_key(&StopId(6)));

        let q = f.long_short();
        assert!(q.td_start.contains_key(&StopId(4)));
        assert!(q.td_dest.contains_key(&StopId(5)));

        let q = f.walk_short();
        assert_eq!(q.start.len(), 1);
        assert!(q.td_start.is_empty());
        assert!(q.td_dest.contains_key(&StopId(5)));
    }
}
