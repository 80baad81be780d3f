//! Two-phase dispatch-broker protocol.
//!
//! Candidate rides are cleared with the fleet operator twice per
//! request: the *blacklist* exchange narrows the generated candidates to
//! those inside serviceable time windows before the transit searches
//! run, and the *whitelist* exchange confirms the rides the produced
//! itineraries actually use before any of them is returned. No ride
//! reaches a response without a whitelist confirmation.

use std::future::Future;

mod apply;
mod client;
mod error;
pub mod mock;
mod types;

pub use apply::{ConfirmedRides, apply_blacklist, confirmed_rides};
pub use client::{BrokerClient, BrokerConfig};
pub use error::BrokerError;
pub use types::{
    BlacklistResponse, BrokerRequest, CapacitiesDto, DirectTimes, StopGroup, WhichMile,
    WhitelistResponse, WindowDto, broker_time, build_request, group_by_stop,
};

/// The fleet-operator side of the two-phase protocol.
pub trait Broker: Send + Sync {
    /// Ask which candidate rides fall into serviceable time windows.
    fn blacklist(
        &self,
        request: &BrokerRequest,
    ) -> impl Future<Output = Result<BlacklistResponse, BrokerError>> + Send;

    /// Ask for firm confirmation of the rides itineraries will use.
    fn whitelist(
        &self,
        request: &BrokerRequest,
    ) -> impl Future<Output = Result<WhitelistResponse, BrokerError>> + Send;
}
