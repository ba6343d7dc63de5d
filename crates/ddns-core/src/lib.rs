// # ddns-core
//
// Core library for the polling DDNS updater.
//
// ## Architecture Overview
//
// This library provides the core functionality for dynamic DNS updates:
// - **IpSource**: Trait for discovering the current public address
// - **DnsProvider**: Trait for updating a DNS record via a provider API
// - **DdnsEngine**: Scheduler running the observe → compare → update cycle
// - **DdnsConfig**: Environment-sourced, immutable configuration
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from HTTP implementations
// 2. **Sequential**: One cycle at a time, no overlap, no background tasks
// 3. **Explicit State**: The last known address flows through each cycle as a value
// 4. **Never Fatal**: Cycle errors are logged; only a shutdown signal stops the loop

pub mod traits;
pub mod engine;
pub mod config;
pub mod error;

// Re-export core types for convenience
pub use traits::{IpSource, DnsProvider};
pub use engine::{DdnsEngine, EngineEvent, EngineState};
pub use config::{CloudflareSettings, DdnsConfig, EngineConfig, IpSourceConfig};
pub use error::{Error, Result};
