// # Cloudflare DNS Provider
//
// This crate provides the Cloudflare DNS provider for the DDNS updater.
//
// ## Behavior
//
// - ✅ One PUT per update attempt, addressed by zone id and record id
// - ✅ Settings validated before any request (missing values → `Error::Config`)
// - ✅ HTTP timeout configured (30 seconds by default)
// - ✅ Response envelope decoded; `success: false` → `Error::Provider` with
//   every message Cloudflare reported
// - ✅ Dry-run mode for safe testing
// - ❌ NO retry logic (the engine's next tick retries)
// - ❌ NO lookups: zone and record ids come from configuration
//
// The HTTP status code is not interpreted on its own. Cloudflare answers
// rejected requests with the same JSON envelope, so the envelope decides.
//
// ## Security Requirements
//
// - API token NEVER appears in logs or Debug output
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - Update DNS Record: PUT `/zones/:zone_id/dns_records/:record_id`

use async_trait::async_trait;
use ddns_core::config::{CloudflareSettings, DEFAULT_HTTP_TIMEOUT_SECS, DdnsConfig};
use ddns_core::traits::DnsProvider;
use ddns_core::{Error, Result};
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::time::Duration;

/// Cloudflare API base URL
pub const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Default HTTP timeout for API requests
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS);

/// TTL value Cloudflare treats as "automatic"
const AUTOMATIC_TTL: u32 = 1;

/// Desired state of the A record, as sent to Cloudflare
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateDnsRequest {
    #[serde(rename = "type")]
    pub record_type: &'static str,
    pub name: String,
    pub content: String,
    pub ttl: u32,
    pub proxied: bool,
}

impl UpdateDnsRequest {
    /// Unproxied A record with automatic TTL
    pub fn a_record(name: impl Into<String>, address: Ipv4Addr) -> Self {
        Self {
            record_type: "A",
            name: name.into(),
            content: address.to_string(),
            ttl: AUTOMATIC_TTL,
            proxied: false,
        }
    }
}

/// Envelope returned by every Cloudflare API v4 call
#[derive(Debug, Clone, Deserialize)]
pub struct CloudflareResponse {
    pub success: bool,
    #[serde(default)]
    pub errors: Vec<CloudflareMessage>,
}

/// One entry of the `errors` array
#[derive(Debug, Clone, Deserialize)]
pub struct CloudflareMessage {
    #[serde(default)]
    pub code: Option<i64>,
    pub message: String,
}

impl std::fmt::Display for CloudflareMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.code {
            Some(code) => write!(f, "{} (code {})", self.message, code),
            None => f.write_str(&self.message),
        }
    }
}

/// Cloudflare DNS provider
///
/// Maintains the single record named by its [`CloudflareSettings`].
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the provider validates settings and logs the
/// intended PUT payload but does not send it, then reports success.
pub struct CloudflareProvider {
    /// Token, zone id, record id and record name
    /// ⚠️ NEVER log the token
    settings: CloudflareSettings,

    /// API base URL (overridable for tests)
    api_base: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Dry-run mode: if true, skip the PUT
    dry_run: bool,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for CloudflareProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareProvider")
            .field("settings", &self.settings)
            .field("api_base", &self.api_base)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl CloudflareProvider {
    /// Create a new Cloudflare provider
    ///
    /// Settings are not validated here; each update attempt checks them.
    ///
    /// # Parameters
    ///
    /// - `settings`: Token and record coordinates
    /// - `timeout`: Timeout applied to each request
    /// - `dry_run`: If true, log the PUT instead of sending it
    pub fn new(settings: CloudflareSettings, timeout: Duration, dry_run: bool) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::io(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            settings,
            api_base: CLOUDFLARE_API_BASE.to_string(),
            client,
            dry_run,
        })
    }

    /// Create a new Cloudflare provider (production/live mode)
    pub fn new_live(settings: CloudflareSettings) -> Result<Self> {
        Self::new(settings, DEFAULT_HTTP_TIMEOUT, false)
    }

    /// Create a new Cloudflare provider (dry-run mode)
    pub fn new_dry_run(settings: CloudflareSettings) -> Result<Self> {
        Self::new(settings, DEFAULT_HTTP_TIMEOUT, true)
    }

    /// Create from the daemon configuration
    pub fn from_config(config: &DdnsConfig) -> Result<Self> {
        if config.dry_run {
            tracing::warn!("Cloudflare provider running in DRY-RUN mode - no changes will be made");
        }
        Self::new(config.provider.clone(), config.http_timeout, config.dry_run)
    }

    /// Send requests to `api_base` instead of the public API
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Whether the provider skips the PUT
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    fn record_url(&self) -> String {
        format!(
            "{}/zones/{}/dns_records/{}",
            self.api_base, self.settings.zone_id, self.settings.record_id
        )
    }
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    /// Point the configured A record at `address`
    ///
    /// # API Call
    ///
    /// ```http
    /// PUT /zones/:zone_id/dns_records/:record_id
    /// Authorization: Bearer <token>
    /// Content-Type: application/json
    ///
    /// { "type": "A", "name": "<record>", "content": "1.2.3.4", "ttl": 1, "proxied": false }
    /// ```
    async fn update_record(&self, address: Ipv4Addr) -> Result<()> {
        self.settings.validate()?;

        let request = UpdateDnsRequest::a_record(&self.settings.record_name, address);
        let body = serde_json::to_vec(&request)?;
        let url = self.record_url();

        tracing::info!(
            "Updating Cloudflare DNS record: {} -> {} [mode: {}]",
            self.settings.record_name,
            address,
            if self.dry_run { "DRY-RUN" } else { "LIVE" }
        );

        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would send PUT request to {} with payload: {}",
                url,
                String::from_utf8_lossy(&body)
            );
            return Ok(());
        }

        let response = self
            .client
            .put(&url)
            .bearer_auth(&self.settings.api_token)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| Error::io(format!("failed to send update request: {}", e)))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::io(format!("failed to read Cloudflare response: {}", e)))?;

        let envelope: CloudflareResponse = serde_json::from_slice(&bytes).map_err(|e| {
            Error::io(format!(
                "failed to parse Cloudflare response (HTTP {}): {}",
                status, e
            ))
        })?;

        if !envelope.success {
            tracing::debug!("Cloudflare rejected update with HTTP {}", status);
            return Err(Error::provider(
                self.provider_name(),
                envelope.errors.iter().map(ToString::to_string),
            ));
        }

        Ok(())
    }

    fn record_name(&self) -> &str {
        &self.settings.record_name
    }

    fn provider_name(&self) -> &'static str {
        "cloudflare"
    }
}
