// # HTTP IP Source
//
// This crate provides the HTTP echo-service IP source for the DDNS updater.
//
// ## Architecture
//
// Each call to `current()` issues one GET to an address echo endpoint
// (e.g. api.ipify.org) and interprets the plain-text body as the caller's
// public IPv4 address. Nothing is cached and nothing is retried; the engine's
// next tick is the retry.
//
// ## Validation
//
// The body is trimmed and must parse as an IPv4 address. Anything else
// (an HTML error page, an IPv6 address, an empty body) fails the cycle with
// `Error::InvalidAddress` instead of being pushed to DNS.
//
// The HTTP status is only logged. A body that parses as an address is
// accepted whatever the status.

use ddns_core::config::{DEFAULT_HTTP_TIMEOUT_SECS, IpSourceConfig};
use ddns_core::traits::IpSource;
use ddns_core::{Error, Result};

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

/// Longest body echoed back in an error message
const MAX_ECHOED_BODY_CHARS: usize = 64;

/// HTTP-based IP source
#[derive(Debug, Clone)]
pub struct HttpIpSource {
    /// URL to fetch IP from
    url: String,

    /// Timeout applied to each request
    timeout: Duration,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpIpSource {
    /// Create a new HTTP IP source with the default timeout
    ///
    /// # Parameters
    ///
    /// - `url`: URL to fetch IP from (e.g., "https://api.ipify.org")
    pub fn new(url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(url, Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS))
    }

    /// Create with a custom request timeout
    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::io(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: url.into(),
            timeout,
            client,
        })
    }

    /// Create from configuration
    pub fn from_config(config: &IpSourceConfig, timeout: Duration) -> Result<Self> {
        Self::with_timeout(config.url.clone(), timeout)
    }

    /// The echo endpoint this source queries
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Timeout applied to each request
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait::async_trait]
impl IpSource for HttpIpSource {
    async fn current(&self) -> Result<Ipv4Addr> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::io(format!("failed to get current IP: {}", e)))?;

        let status = response.status();

        let ip_text = response
            .text()
            .await
            .map_err(|e| Error::io(format!("failed to read IP response: {}", e)))?;

        tracing::debug!("Echo endpoint answered {} with {} bytes", status, ip_text.len());

        parse_ipv4(&ip_text)
    }

    fn source_name(&self) -> &'static str {
        "http"
    }
}

/// Interpret an echo body as an IPv4 address
fn parse_ipv4(body: &str) -> Result<Ipv4Addr> {
    let text = body.trim();

    match text.parse::<IpAddr>() {
        Ok(IpAddr::V4(ip)) => Ok(ip),
        Ok(IpAddr::V6(ip)) => Err(Error::invalid_address(format!(
            "expected an IPv4 address, got {}",
            ip
        ))),
        Err(_) => {
            let shown: String = text.chars().take(MAX_ECHOED_BODY_CHARS).collect();
            Err(Error::invalid_address(format!(
                "echo endpoint returned {:?}",
                shown
            )))
        }
    }
}
