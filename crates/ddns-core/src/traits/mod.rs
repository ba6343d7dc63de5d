//! Core traits for the DDNS updater
//!
//! - [`IpSource`]: Discover the current public address
//! - [`DnsProvider`]: Point a DNS record at an address

pub mod ip_source;
pub mod dns_provider;

pub use ip_source::IpSource;
pub use dns_provider::DnsProvider;
