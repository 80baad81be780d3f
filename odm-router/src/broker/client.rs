//! Dispatch-broker HTTP client.
//!
//! Posts the blacklist and whitelist requests as JSON and parses the
//! broker's answers. The broker is an external fleet operator; its
//! availability is never load-bearing, callers degrade to plain transit
//! when an exchange fails.

use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;

use super::Broker;
use super::error::BrokerError;
use super::types::{BlacklistResponse, BrokerRequest, WhitelistResponse};

const BLACKLIST_PATH: &str = "/api/blacklisting";
const WHITELIST_PATH: &str = "/api/whitelisting";

/// Default timeout for one broker exchange, in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Configuration for the broker client.
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    /// Base URL of the broker, without trailing slash.
    pub base_url: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl BrokerConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// HTTP implementation of [`Broker`].
#[derive(Debug, Clone)]
pub struct BrokerClient {
    http: reqwest::Client,
    blacklist_url: String,
    whitelist_url: String,
}

impl BrokerClient {
    pub fn new(config: BrokerConfig) -> Result<Self, BrokerError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            blacklist_url: format!("{}{}", config.base_url, BLACKLIST_PATH),
            whitelist_url: format!("{}{}", config.base_url, WHITELIST_PATH),
        })
    }

    async fn post<T: DeserializeOwned>(
        &self,
        url: &str,
        request: &BrokerRequest,
    ) -> Result<T, BrokerError> {
        let response = self.http.post(url).json(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BrokerError::status(status.as_u16(), &body));
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| BrokerError::parse(&e, &body))
    }
}

impl Broker for BrokerClient {
    async fn blacklist(&self, request: &BrokerRequest) -> Result<BlacklistResponse, BrokerError> {
        tracing::debug!(
            start_groups = request.start_bus_stops.len(),
            target_groups = request.target_bus_stops.len(),
            direct = request.direct_times.len(),
            "posting blacklist request"
        );
        self.post(&self.blacklist_url, request).await
    }

    async fn whitelist(&self, request: &BrokerRequest) -> Result<WhitelistResponse, BrokerError> {
        tracing::debug!(
            start_groups = request.start_bus_stops.len(),
            target_groups = request.target_bus_stops.len(),
            direct = request.direct_times.len(),
            "posting whitelist request"
        );
        self.post(&self.whitelist_url, request).await
    }
}
