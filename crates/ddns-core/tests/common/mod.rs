//! Test doubles and common utilities for engine contract tests
//!
//! The doubles record every call so tests can assert on how many outbound
//! operations a cycle performed, without any network access.

#![allow(dead_code)]

use ddns_core::config::EngineConfig;
use ddns_core::error::{Error, Result};
use ddns_core::traits::{DnsProvider, IpSource};
use ddns_core::{DdnsEngine, EngineEvent};
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// An IpSource that replays a fixed script of observations
///
/// `None` entries fail with an I/O error. Once the script is exhausted the
/// last entry repeats.
pub struct ScriptedIpSource {
    script: Arc<Vec<Option<Ipv4Addr>>>,
    call_count: Arc<AtomicUsize>,
}

impl ScriptedIpSource {
    pub fn new(script: Vec<Option<Ipv4Addr>>) -> Self {
        assert!(!script.is_empty(), "script needs at least one entry");
        Self {
            script: Arc::new(script),
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Always report the same address
    pub fn fixed(ip: Ipv4Addr) -> Self {
        Self::new(vec![Some(ip)])
    }

    /// Get the number of times current() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Create a new ScriptedIpSource that shares its script and counter
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            script: Arc::clone(&other.script),
            call_count: Arc::clone(&other.call_count),
        }
    }
}

#[async_trait::async_trait]
impl IpSource for ScriptedIpSource {
    async fn current(&self) -> Result<Ipv4Addr> {
        let call = self.call_count.fetch_add(1, Ordering::SeqCst);
        let index = call.min(self.script.len() - 1);

        self.script[index].ok_or_else(|| Error::io("echo endpoint unreachable"))
    }

    fn source_name(&self) -> &'static str {
        "scripted"
    }
}

/// A DnsProvider that records every update attempt
pub struct RecordingProvider {
    /// Addresses passed to update_record(), in call order
    updates: Arc<Mutex<Vec<Ipv4Addr>>>,
    /// Number of upcoming calls that fail
    failures_remaining: Arc<AtomicUsize>,
}

impl RecordingProvider {
    pub fn new() -> Self {
        Self {
            updates: Arc::new(Mutex::new(Vec::new())),
            failures_remaining: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Make the next `count` calls fail with a provider error
    pub fn failing_next(count: usize) -> Self {
        let provider = Self::new();
        provider.failures_remaining.store(count, Ordering::SeqCst);
        provider
    }

    /// Get the number of times update_record() was called
    pub fn update_call_count(&self) -> usize {
        self.updates.lock().unwrap().len()
    }

    /// Get the addresses that were sent, in order
    pub fn updated_addresses(&self) -> Vec<Ipv4Addr> {
        self.updates.lock().unwrap().clone()
    }

    /// Create a new RecordingProvider that shares counters with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            updates: Arc::clone(&other.updates),
            failures_remaining: Arc::clone(&other.failures_remaining),
        }
    }
}

#[async_trait::async_trait]
impl DnsProvider for RecordingProvider {
    async fn update_record(&self, address: Ipv4Addr) -> Result<()> {
        self.updates.lock().unwrap().push(address);

        let should_fail = self
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();

        if should_fail {
            Err(Error::provider("test", ["record not found"]))
        } else {
            Ok(())
        }
    }

    fn record_name(&self) -> &str {
        "home.example.com"
    }

    fn provider_name(&self) -> &'static str {
        "test"
    }
}

/// Engine configuration with the given interval
pub fn engine_config(interval: Duration) -> EngineConfig {
    EngineConfig {
        interval,
        event_channel_capacity: 100,
    }
}

/// Build an engine whose doubles share counters with the ones returned
pub fn engine_with(
    source: &ScriptedIpSource,
    provider: &RecordingProvider,
    interval: Duration,
) -> (DdnsEngine, mpsc::Receiver<EngineEvent>) {
    DdnsEngine::new(
        Box::new(ScriptedIpSource::sharing_counters_with(source)),
        Box::new(RecordingProvider::sharing_counters_with(provider)),
        &engine_config(interval),
    )
}

/// Drain every event currently buffered in the channel
pub fn drain_events(rx: &mut mpsc::Receiver<EngineEvent>) -> Vec<EngineEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
