//! Core DDNS engine
//!
//! The DdnsEngine is responsible for:
//! - Asking the IpSource for the current address
//! - Comparing it with the last address propagated to the provider
//! - Updating the DNS record via DnsProvider when the address changed
//! - Repeating on a fixed interval until shutdown
//!
//! ## Architecture
//!
//! ```text
//!        ┌──────────────┐  tick / shutdown
//!        │  DdnsEngine  │◄──────────────────
//!        └──────────────┘
//!               │ run_cycle(state) -> state
//!       ┌───────┴──────────────┬───────────────────────────┐
//!       ▼                      ▼                           ▼
//! ┌─────────────┐       ┌──────────────┐            ┌─────────────┐
//! │  IpSource   │       │ DnsProvider  │            │   Events    │
//! │ (observe)   │       │ (update)     │            │  (notify)   │
//! └─────────────┘       └──────────────┘            └─────────────┘
//! ```
//!
//! ## Cycle Flow
//!
//! 1. Fetch the current address; on failure log and keep the state
//! 2. If it equals the last known address, log "no change" and stop
//! 3. Otherwise call DnsProvider::update_record()
//! 4. On success, the returned state carries the new address
//!
//! Cycles never overlap: the loop awaits each cycle before it looks at the
//! timer or the shutdown signal again.

use crate::config::{EngineConfig, MAX_INTERVAL_MINUTES};
use crate::error::Result;
use crate::traits::{DnsProvider, IpSource};
use std::future::Future;
use std::net::Ipv4Addr;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Events emitted by the DdnsEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Engine started
    Started {
        record_name: String,
        interval: Duration,
    },

    /// The IP source reported an address
    AddressObserved {
        ip: Ipv4Addr,
    },

    /// The IP source failed; the cycle ended without touching DNS
    ObservationFailed {
        error: String,
    },

    /// DNS update skipped (address unchanged)
    UpdateSkipped {
        record_name: String,
        current_ip: Ipv4Addr,
    },

    /// DNS update succeeded
    UpdateSucceeded {
        record_name: String,
        new_ip: Ipv4Addr,
        previous_ip: Option<Ipv4Addr>,
    },

    /// DNS update failed; the next cycle tries again
    UpdateFailed {
        record_name: String,
        new_ip: Ipv4Addr,
        error: String,
    },

    /// Engine stopped
    Stopped {
        reason: String,
    },
}

/// State carried from one cycle to the next
///
/// Holds the address last confirmed by the provider. It starts empty on
/// every process start, so the first successful observation always
/// triggers an update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineState {
    last_known_ip: Option<Ipv4Addr>,
}

impl EngineState {
    /// Create an empty state (no address propagated yet)
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a state that already knows an address
    pub fn with_last_known_ip(ip: Ipv4Addr) -> Self {
        Self {
            last_known_ip: Some(ip),
        }
    }

    /// The address last confirmed by the provider
    pub fn last_known_ip(&self) -> Option<Ipv4Addr> {
        self.last_known_ip
    }
}

/// Core DDNS engine
///
/// ## Lifecycle
///
/// 1. Create with [`DdnsEngine::new()`]
/// 2. Start with [`DdnsEngine::run()`] (OS signals) or
///    [`DdnsEngine::run_until()`] (any shutdown future)
/// 3. One cycle runs immediately, then one per interval
/// 4. Returns the final state once shutdown is observed
pub struct DdnsEngine {
    /// IP source for observing the public address
    ip_source: Box<dyn IpSource>,

    /// DNS provider for updating the record
    provider: Box<dyn DnsProvider>,

    /// Time between cycles
    interval: Duration,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<EngineEvent>,
}

impl DdnsEngine {
    /// Create a new DDNS engine
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields engine events.
    /// Dropping the receiver is fine; events are then discarded silently.
    pub fn new(
        ip_source: Box<dyn IpSource>,
        provider: Box<dyn DnsProvider>,
        config: &EngineConfig,
    ) -> (Self, mpsc::Receiver<EngineEvent>) {
        let (tx, rx) = mpsc::channel(config.event_channel_capacity.max(1));

        let max_interval = Duration::from_secs(MAX_INTERVAL_MINUTES * 60);
        let interval = if config.interval.is_zero() {
            let fallback = EngineConfig::default().interval;
            warn!("Engine interval must be greater than zero, using {:?}", fallback);
            fallback
        } else if config.interval > max_interval {
            warn!(
                "Engine interval {:?} exceeds the maximum, using {:?}",
                config.interval, max_interval
            );
            max_interval
        } else {
            config.interval
        };

        let engine = Self {
            ip_source,
            provider,
            interval,
            event_tx: tx,
        };

        (engine, rx)
    }

    /// The interval between two cycles
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run until SIGINT or SIGTERM (Ctrl-C on non-unix platforms)
    ///
    /// Signal handlers are installed before the first cycle, so a signal
    /// delivered during that cycle still stops the loop right after it.
    ///
    /// # Returns
    ///
    /// - `Ok(EngineState)`: Clean shutdown, with the last known address
    /// - `Err(Error)`: Signal handlers could not be installed
    pub async fn run(&self) -> Result<EngineState> {
        let signal = shutdown_signal()?;
        Ok(self.run_until(signal).await)
    }

    /// Run until `shutdown` resolves
    ///
    /// Shutdown is only observed between cycles; an in-flight cycle is
    /// allowed to finish (each outbound call is bounded by its own timeout).
    pub async fn run_until<F>(&self, shutdown: F) -> EngineState
    where
        F: Future<Output = ()>,
    {
        info!(
            "Starting DDNS engine for {} (interval: {:?})",
            self.provider.record_name(),
            self.interval
        );
        self.emit_event(EngineEvent::Started {
            record_name: self.provider.record_name().to_string(),
            interval: self.interval,
        });

        let mut state = self.run_cycle(EngineState::new()).await;

        // The immediate cycle above replaces the interval's first tick
        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    info!("Shutting down gracefully...");
                    self.emit_event(EngineEvent::Stopped {
                        reason: "Shutdown signal".to_string(),
                    });
                    break;
                }

                _ = ticker.tick() => {
                    state = self.run_cycle(state).await;
                }
            }
        }

        state
    }

    /// Run one check-and-update cycle
    ///
    /// Never fails: every error is logged and the incoming state is returned
    /// unchanged, so a failed update is attempted again next cycle.
    pub async fn run_cycle(&self, state: EngineState) -> EngineState {
        let current_ip = match self.ip_source.current().await {
            Ok(ip) => ip,
            Err(e) => {
                error!("Error checking current IP via {}: {}", self.ip_source.source_name(), e);
                self.emit_event(EngineEvent::ObservationFailed {
                    error: e.to_string(),
                });
                return state;
            }
        };

        info!("Current IP: {}", current_ip);
        self.emit_event(EngineEvent::AddressObserved { ip: current_ip });

        let record_name = self.provider.record_name();

        if state.last_known_ip == Some(current_ip) {
            info!("IP has not changed, no update needed");
            self.emit_event(EngineEvent::UpdateSkipped {
                record_name: record_name.to_string(),
                current_ip,
            });
            return state;
        }

        debug!(
            "IP change detected: {} -> {}",
            state
                .last_known_ip
                .map(|ip| ip.to_string())
                .unwrap_or_else(|| "None".to_string()),
            current_ip
        );

        match self.provider.update_record(current_ip).await {
            Ok(()) => {
                info!(
                    "Successfully updated {} DNS record {} to {}",
                    self.provider.provider_name(),
                    record_name,
                    current_ip
                );
                self.emit_event(EngineEvent::UpdateSucceeded {
                    record_name: record_name.to_string(),
                    new_ip: current_ip,
                    previous_ip: state.last_known_ip,
                });
                EngineState::with_last_known_ip(current_ip)
            }
            Err(e) => {
                error!(
                    "Failed to update {} DNS record {}: {}",
                    self.provider.provider_name(),
                    record_name,
                    e
                );
                self.emit_event(EngineEvent::UpdateFailed {
                    record_name: record_name.to_string(),
                    new_ip: current_ip,
                    error: e.to_string(),
                });
                state
            }
        }
    }

    /// Emit an engine event
    fn emit_event(&self, event: EngineEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                warn!("Event channel full, dropping event: {:?}", event);
            }
            // Nobody is listening
            Err(TrySendError::Closed(_)) => {}
        }
    }
}

/// Build a future resolving on SIGINT or SIGTERM
///
/// Handlers are registered eagerly so that signals delivered before the
/// future is first polled are not lost.
#[cfg(unix)]
fn shutdown_signal() -> Result<impl Future<Output = ()>> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| crate::Error::io(format!("Failed to setup SIGTERM handler: {}", e)))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| crate::Error::io(format!("Failed to setup SIGINT handler: {}", e)))?;

    Ok(async move {
        tokio::select! {
            _ = sigterm.recv() => info!("Received SIGTERM"),
            _ = sigint.recv() => info!("Received SIGINT"),
        }
    })
}

/// Build a future resolving on Ctrl-C
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
fn shutdown_signal() -> Result<impl Future<Output = ()>> {
    Ok(async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl-C"),
            Err(e) => {
                error!("Failed to wait for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        }
    })
}
