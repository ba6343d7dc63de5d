//! Contract Test: Check-and-Update Cycle
//!
//! Constraints verified:
//! - The same address observed twice triggers at most one update
//! - A changed address triggers exactly one update with the new address
//! - A failed update leaves the state untouched so the next cycle retries
//! - A failed observation never reaches the provider
//!
//! If this test fails, the change detection in `run_cycle` is broken.

mod common;

use common::*;
use ddns_core::{EngineEvent, EngineState};
use std::net::Ipv4Addr;
use std::time::Duration;

const A: Ipv4Addr = Ipv4Addr::new(198, 51, 100, 7);
const B: Ipv4Addr = Ipv4Addr::new(203, 0, 113, 5);
const INTERVAL: Duration = Duration::from_secs(600);

#[tokio::test]
async fn unchanged_address_skips_update() {
    let source = ScriptedIpSource::fixed(A);
    let provider = RecordingProvider::new();
    let (engine, _event_rx) = engine_with(&source, &provider, INTERVAL);

    let state = engine.run_cycle(EngineState::new()).await;
    let state = engine.run_cycle(state).await;

    assert_eq!(provider.update_call_count(), 1, "second cycle must not update");
    assert_eq!(state.last_known_ip(), Some(A));
}

#[tokio::test]
async fn changed_address_triggers_exactly_one_update() {
    let source = ScriptedIpSource::new(vec![Some(A), Some(B)]);
    let provider = RecordingProvider::new();
    let (engine, _event_rx) = engine_with(&source, &provider, INTERVAL);

    let state = engine.run_cycle(EngineState::with_last_known_ip(A)).await;
    let state = engine.run_cycle(state).await;

    assert_eq!(provider.updated_addresses(), vec![B]);
    assert_eq!(state.last_known_ip(), Some(B));
}

#[tokio::test]
async fn failed_update_is_retried_next_cycle() {
    let source = ScriptedIpSource::fixed(B);
    let provider = RecordingProvider::failing_next(1);
    let (engine, mut event_rx) = engine_with(&source, &provider, INTERVAL);

    let initial = EngineState::with_last_known_ip(A);
    let state = engine.run_cycle(initial).await;
    assert_eq!(state, initial, "failed update must not touch the state");

    let state = engine.run_cycle(state).await;

    assert_eq!(provider.updated_addresses(), vec![B, B]);
    assert_eq!(state.last_known_ip(), Some(B));

    let events = drain_events(&mut event_rx);
    assert!(events.iter().any(|e| matches!(
        e,
        EngineEvent::UpdateFailed { new_ip, error, .. }
            if *new_ip == B && error.contains("record not found")
    )));
    assert!(events.iter().any(|e| matches!(
        e,
        EngineEvent::UpdateSucceeded { new_ip, previous_ip, .. }
            if *new_ip == B && *previous_ip == Some(A)
    )));
}

#[tokio::test]
async fn failed_observation_leaves_state_and_provider_alone() {
    let source = ScriptedIpSource::new(vec![None]);
    let provider = RecordingProvider::new();
    let (engine, mut event_rx) = engine_with(&source, &provider, INTERVAL);

    let initial = EngineState::with_last_known_ip(A);
    let state = engine.run_cycle(initial).await;

    assert_eq!(state, initial);
    assert_eq!(provider.update_call_count(), 0);

    let events = drain_events(&mut event_rx);
    assert!(matches!(
        events.as_slice(),
        [EngineEvent::ObservationFailed { error }] if error.contains("unreachable")
    ));
}

#[tokio::test]
async fn first_observation_updates_then_settles() {
    // Empty state, echo returns 203.0.113.5, provider succeeds; the next
    // cycle sees the same address and leaves DNS alone.
    let source = ScriptedIpSource::fixed(B);
    let provider = RecordingProvider::new();
    let (engine, mut event_rx) = engine_with(&source, &provider, INTERVAL);

    let state = engine.run_cycle(EngineState::new()).await;
    assert_eq!(state.last_known_ip(), Some(B));
    assert_eq!(provider.updated_addresses(), vec![B]);

    let state = engine.run_cycle(state).await;
    assert_eq!(state.last_known_ip(), Some(B));
    assert_eq!(provider.update_call_count(), 1);
    assert_eq!(source.call_count(), 2);

    let events = drain_events(&mut event_rx);
    assert_eq!(
        events,
        vec![
            EngineEvent::AddressObserved { ip: B },
            EngineEvent::UpdateSucceeded {
                record_name: "home.example.com".to_string(),
                new_ip: B,
                previous_ip: None,
            },
            EngineEvent::AddressObserved { ip: B },
            EngineEvent::UpdateSkipped {
                record_name: "home.example.com".to_string(),
                current_ip: B,
            },
        ]
    );
}
