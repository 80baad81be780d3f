//! Mock broker for development and testing without a fleet operator.
//!
//! Answers are either synthesized to accept every candidate, or scripted
//! ahead of time. Every request is recorded so tests can assert on what
//! was sent.

use std::collections::VecDeque;
use std::sync::Mutex;

use super::Broker;
use super::error::BrokerError;
use super::types::{BlacklistResponse, BrokerRequest, WhitelistResponse, WindowDto};

/// In-memory [`Broker`] implementation.
pub struct MockBroker {
    accept_all: bool,
    blacklist_queue: Mutex<VecDeque<Result<BlacklistResponse, BrokerError>>>,
    whitelist_queue: Mutex<VecDeque<Result<WhitelistResponse, BrokerError>>>,
    requests: Mutex<Vec<BrokerRequest>>,
}

impl MockBroker {
    /// A broker that declares every candidate serviceable and confirms
    /// every ride.
    pub fn accepting() -> Self {
        Self {
            accept_all: true,
            blacklist_queue: Mutex::new(VecDeque::new()),
            whitelist_queue: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A broker that only serves scripted answers.
    pub fn scripted() -> Self {
        Self {
            accept_all: false,
            blacklist_queue: Mutex::new(VecDeque::new()),
            whitelist_queue: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn push_blacklist(&self, response: Result<BlacklistResponse, BrokerError>) {
        self.blacklist_queue.lock().unwrap().push_back(response);
    }

    pub fn push_whitelist(&self, response: Result<WhitelistResponse, BrokerError>) {
        self.whitelist_queue.lock().unwrap().push_back(response);
    }

    /// All requests received so far, in order.
    pub fn requests(&self) -> Vec<BrokerRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn record(&self, request: &BrokerRequest) {
        self.requests.lock().unwrap().push(request.clone());
    }
}

fn accept_everything_window() -> WindowDto {
    WindowDto {
        start_time: i64::MIN / 2,
        end_time: i64::MAX / 2,
    }
}

fn accept_blacklist(request: &BrokerRequest) -> BlacklistResponse {
    BlacklistResponse {
        start: request
            .start_bus_stops
            .iter()
            .map(|_| vec![accept_everything_window()])
            .collect(),
        target: request
            .target_bus_stops
            .iter()
            .map(|_| vec![accept_everything_window()])
            .collect(),
        direct: if request.direct_times.is_empty() {
            vec![]
        } else {
            vec![accept_everything_window()]
        },
    }
}

fn accept_whitelist(request: &BrokerRequest) -> WhitelistResponse {
    WhitelistResponse {
        start: request
            .start_bus_stops
            .iter()
            .map(|g| vec![true; g.times.len()])
            .collect(),
        target: request
            .target_bus_stops
            .iter()
            .map(|g| vec![true; g.times.len()])
            .collect(),
        direct: vec![true; request.direct_times.len()],
    }
}

fn unscripted<T>() -> Result<T, BrokerError> {
    Err(BrokerError::status(0, "no scripted response queued"))
}

impl Broker for MockBroker {
    async fn blacklist(&self, request: &BrokerRequest) -> Result<BlacklistResponse, BrokerError> {
        self.record(request);
        if let Some(response) = self.blacklist_queue.lock().unwrap().pop_front() {
            return response;
        }
        if self.accept_all {
            Ok(accept_blacklist(request))
        } else {
            unscripted()
        }
    }

    async fn whitelist(&self, request: &BrokerRequest) -> Result<WhitelistResponse, BrokerError> {
        self.record(request);
        if let Some(response) = self.whitelist_queue.lock().unwrap().pop_front() {
            return response;
        }
        if self.accept_all {
            Ok(accept_whitelist(request))
        } else {
            unscripted()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::types::{CapacitiesDto, StopGroup};
    use crate::domain::LatLng;

    fn request() -> BrokerRequest {
        BrokerRequest {
            start: LatLng::new(49.0, 8.4),
            target: LatLng::new(49.2, 8.6),
            start_bus_stops: vec![StopGroup {
                lat: 49.01,
                lng: 8.41,
                times: vec![900_000, 4_500_000],
            }],
            target_bus_stops: vec![],
            direct_times: vec![],
            start_fixed: true,
            capacities: CapacitiesDto {
                wheelchairs: 0,
                bikes: 0,
                passengers: 1,
                luggage: 0,
            },
        }
    }

    #[tokio::test]
    async fn accepting_mock_mirrors_request_shape() {
        let broker = MockBroker::accepting();
        let black = broker.blacklist(&request()).await.unwrap();
        assert_eq!(black.start.len(), 1);
        assert!(black.direct.is_empty());

        let white = broker.whitelist(&request()).await.unwrap();
        assert_eq!(white.start, vec![vec![true, true]]);

        assert_eq!(broker.requests().len(), 2);
    }

    #[tokio::test]
    async fn scripted_mock_serves_in_order_then_errors() {
        let broker = MockBroker::scripted();
        broker.push_blacklist(Ok(BlacklistResponse {
            start: vec![vec![]],
            target: vec![],
            direct: vec![],
        }));

        let first = broker.blacklist(&request()).await.unwrap();
        assert_eq!(first.start, vec![Vec::<WindowDto>::new()]);

        assert!(broker.blacklist(&request()).await.is_err());
    }
}
