//! On-demand mobility routing layer.
//!
//! Augments a scheduled-transit search with taxi / ride-sharing legs
//! negotiated with an external dispatch broker: candidates in, a
//! blacklist and a whitelist exchange around the search, confirmed
//! itineraries out.

pub mod broker;
pub mod config;
pub mod domain;
pub mod encoder;
pub mod external;
pub mod generator;
pub mod merge;
pub mod orchestrator;
pub mod queries;
pub mod state;
