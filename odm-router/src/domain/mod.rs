//! Domain types for the on-demand mobility layer.
//!
//! Value types representing candidate rides, access offsets, itineraries,
//! and the minute-resolution clock shared with the scheduled-transit
//! search.

mod itinerary;
mod location;
mod offset;
mod ride;
mod time;

pub use itinerary::{Itinerary, Leg, OffsetLeg, Signature, TransitLeg};
pub use location::{LatLng, Location, StopId};
pub use offset::{INFEASIBLE, Offset, TdOffset, TransportMode};
pub use ride::{Capacities, DirectRide, Ride, ServiceWindow};
pub use time::{TimeInterval, UnixTime};
