// # DNS Provider Trait
//
// Defines the interface for pointing a DNS record at a new address.
//
// ## Implementations
//
// - Cloudflare: `ddns-provider-cloudflare` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::DnsProvider;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let provider = /* DnsProvider implementation */;
//
//     provider.update_record(std::net::Ipv4Addr::new(203, 0, 113, 5)).await?;
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::net::Ipv4Addr;

/// Trait for DNS provider implementations
///
/// A provider owns exactly one record. Each call to
/// [`update_record`](DnsProvider::update_record) is a single-shot write:
/// validate settings, send one request, interpret one response.
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
///
/// # Forbidden
///
/// - Retry logic or backoff (a failed update is retried on the next tick)
/// - Deciding whether an update is needed (owned by `DdnsEngine`)
/// - Caching state beyond a single request
///
/// ## Examples
///
/// ✅ **CORRECT**: Stateless single-shot API call
/// ```rust,ignore
/// async fn update_record(&self, address: Ipv4Addr) -> Result<()> {
///     self.settings.validate()?;
///     let response = self.http_client
///         .put(self.record_url())
///         .bearer_auth(&self.settings.api_token)
///         .json(&UpdateDnsRequest::a_record(&self.settings.record_name, address))
///         .send()
///         .await?;
///     // Decode the envelope, Err(Error::Provider) on success == false
/// }
/// ```
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Point the configured record at `address`
    ///
    /// # Returns
    ///
    /// - `Ok(())`: The provider confirmed the update
    /// - `Err(Error::Config)`: Required settings are missing; nothing was sent
    /// - `Err(Error::Io | Error::Json)`: Transport or decoding failure
    /// - `Err(Error::Provider)`: The provider rejected the update
    async fn update_record(&self, address: Ipv4Addr) -> Result<(), crate::Error>;

    /// Name of the record this provider maintains
    fn record_name(&self) -> &str;

    /// Get the provider name (for logging/debugging)
    ///
    /// # Returns
    ///
    /// A static string identifying the provider (e.g., "cloudflare")
    fn provider_name(&self) -> &'static str;
}
