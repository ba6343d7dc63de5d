//! Configuration types for the DDNS updater
//!
//! Configuration comes from environment variables, optionally seeded from a
//! local env file. It is read once at startup and never changes afterwards.
//!
//! Provider settings are not validated here: a missing token or
//! identifier fails each update attempt with [`Error::Config`] instead of
//! preventing the daemon from starting.

use crate::error::{Error, Result};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

/// Default echo endpoint returning the caller's public IPv4 address as text
pub const DEFAULT_IP_SOURCE_URL: &str = "https://api.ipify.org";

/// Default polling interval (minutes)
pub const DEFAULT_INTERVAL_MINUTES: u64 = 10;

/// Longest accepted polling interval (minutes, one week)
pub const MAX_INTERVAL_MINUTES: u64 = 7 * 24 * 60;

/// Default timeout applied to every outbound request (seconds)
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Default env file read at startup
pub const DEFAULT_ENV_FILE: &str = ".env";

/// Main DDNS configuration
#[derive(Debug, Clone)]
pub struct DdnsConfig {
    /// Scheduler settings
    pub engine: EngineConfig,

    /// Address echo endpoint settings
    pub ip_source: IpSourceConfig,

    /// Cloudflare record settings
    pub provider: CloudflareSettings,

    /// Timeout applied to each outbound HTTP request
    pub http_timeout: Duration,

    /// Log the provider request instead of sending it
    pub dry_run: bool,
}

impl DdnsConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary variable lookup
    ///
    /// Unset, unparsable or zero numeric values fall back to their defaults
    /// with a warning.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let interval_minutes = match lookup("INTERVAL_MINUTES") {
            Some(raw) => {
                let minutes = parse_positive("INTERVAL_MINUTES", &raw, DEFAULT_INTERVAL_MINUTES);
                if minutes > MAX_INTERVAL_MINUTES {
                    warn!(
                        "INTERVAL_MINUTES {} exceeds the maximum, using {} minutes",
                        minutes, MAX_INTERVAL_MINUTES
                    );
                    MAX_INTERVAL_MINUTES
                } else {
                    minutes
                }
            }
            None => {
                warn!(
                    "INTERVAL_MINUTES is not set, using default interval of {} minutes",
                    DEFAULT_INTERVAL_MINUTES
                );
                DEFAULT_INTERVAL_MINUTES
            }
        };
        let timeout_secs = lookup("DDNS_HTTP_TIMEOUT_SECS")
            .map(|raw| parse_positive("DDNS_HTTP_TIMEOUT_SECS", &raw, DEFAULT_HTTP_TIMEOUT_SECS))
            .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);

        let url = lookup("DDNS_IP_SOURCE_URL")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_IP_SOURCE_URL.to_string());

        let dry_run = lookup("DDNS_MODE")
            .unwrap_or_default()
            .eq_ignore_ascii_case("dry-run");

        Self {
            engine: EngineConfig {
                interval: Duration::from_secs(interval_minutes * 60),
                ..EngineConfig::default()
            },
            ip_source: IpSourceConfig { url },
            provider: CloudflareSettings {
                api_token: lookup("CF_API_TOKEN").unwrap_or_default(),
                zone_id: lookup("CF_ZONE_ID").unwrap_or_default(),
                record_id: lookup("CF_RECORD_ID").unwrap_or_default(),
                record_name: lookup("CF_RECORD_NAME").unwrap_or_default(),
            },
            http_timeout: Duration::from_secs(timeout_secs),
            dry_run,
        }
    }
}

impl Default for DdnsConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

/// Load variables from an env file into the process environment
///
/// Variables already present in the environment are left untouched.
///
/// # Returns
///
/// - `Ok(true)`: the file was found and loaded
/// - `Ok(false)`: no file at `path`
/// - `Err(Error)`: the file exists but could not be read or parsed
pub fn load_env_file(path: &Path) -> Result<bool> {
    match dotenvy::from_path(path) {
        Ok(()) => {
            debug!("Loaded environment from {}", path.display());
            Ok(true)
        }
        Err(e) if e.not_found() => {
            debug!("No env file at {}, using process environment only", path.display());
            Ok(false)
        }
        Err(e) => Err(Error::config(format!(
            "Failed to load env file {}: {}",
            path.display(),
            e
        ))),
    }
}

fn parse_positive(name: &str, raw: &str, default: u64) -> u64 {
    match raw.trim().parse::<u64>() {
        Ok(0) => {
            warn!("{} must be greater than zero, using default of {}", name, default);
            default
        }
        Ok(value) => value,
        Err(e) => {
            warn!("Invalid {} value {:?}: {}, using default of {}", name, raw, e, default);
            default
        }
    }
}

/// Scheduler configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Time between two check-and-update cycles
    ///
    /// Zero falls back to the default; anything longer than
    /// [`MAX_INTERVAL_MINUTES`] is capped by the engine.
    pub interval: Duration,

    /// Capacity of the engine event channel
    ///
    /// When full, new events are dropped with a warning.
    pub event_channel_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_INTERVAL_MINUTES * 60),
            event_channel_capacity: 100,
        }
    }
}

/// Address echo endpoint configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpSourceConfig {
    /// URL returning the public address as plain text
    pub url: String,
}

impl Default for IpSourceConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_IP_SOURCE_URL.to_string(),
        }
    }
}

/// Settings identifying the Cloudflare record to keep up to date
#[derive(Clone, Default, PartialEq, Eq)]
pub struct CloudflareSettings {
    /// API token with Zone:DNS:Edit permission
    pub api_token: String,
    /// Zone identifier
    pub zone_id: String,
    /// Identifier of the A record inside the zone
    pub record_id: String,
    /// Fully qualified record name (e.g. "home.example.com")
    pub record_name: String,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for CloudflareSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareSettings")
            .field("api_token", &"<REDACTED>")
            .field("zone_id", &self.zone_id)
            .field("record_id", &self.record_id)
            .field("record_name", &self.record_name)
            .finish()
    }
}

impl CloudflareSettings {
    /// Check that every setting needed for an update is present
    ///
    /// The error names each missing environment variable.
    pub fn validate(&self) -> Result<()> {
        let missing: Vec<&str> = [
            ("CF_API_TOKEN", &self.api_token),
            ("CF_ZONE_ID", &self.zone_id),
            ("CF_RECORD_ID", &self.record_id),
            ("CF_RECORD_NAME", &self.record_name),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::config(format!(
                "missing required environment variables: {}",
                missing.join(", ")
            )))
        }
    }
}
