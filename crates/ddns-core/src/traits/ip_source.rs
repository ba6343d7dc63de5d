// # IP Source Trait
//
// Defines the interface for discovering the caller's public address.
//
// ## Implementations
//
// - HTTP echo service: `ddns-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::IpSource;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let source = /* IpSource implementation */;
//
//     let current_ip = source.current().await?;
//     println!("Current IP: {}", current_ip);
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::net::Ipv4Addr;

/// Trait for IP source implementations
///
/// A source answers one question per call: what is the public IPv4 address
/// right now? It keeps no history; comparing against the last propagated
/// address is the engine's job.
///
/// Implementations must be thread-safe and usable across async tasks.
///
/// # Forbidden
///
/// - Caching an address between calls
/// - Retrying failed requests (the next tick is the retry)
/// - Spawning background polling tasks
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Get the current public IPv4 address
    ///
    /// # Returns
    ///
    /// - `Ok(Ipv4Addr)`: The address reported for this call
    /// - `Err(Error)`: Transport failure or a response that is not an address
    async fn current(&self) -> Result<Ipv4Addr, crate::Error>;

    /// Get the source name (for logging/debugging)
    fn source_name(&self) -> &'static str;
}
