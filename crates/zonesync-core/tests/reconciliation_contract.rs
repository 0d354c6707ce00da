//! Contract Test: Reconciliation Cycle
//!
//! Constraints verified:
//! - Cold start creates missing zones and never removes anything
//! - A zone is removed only after the registrar stopped claiming it
//! - Unchanged inputs produce no mutations on the next cycle
//! - DNSSEC and TSIG lookups never block a zone creation
//! - A failed create step does not prevent the remove step

mod common;

use common::*;
use zonesync_core::{EngineEvent, ZoneSyncEngine, ZoneType};

fn engine_for(
    registrar: &StubRegistrar,
    edge: &StubEdgeDns,
    config: zonesync_core::SyncConfig,
) -> (ZoneSyncEngine, tokio::sync::mpsc::Receiver<EngineEvent>) {
    ZoneSyncEngine::new(
        Box::new(StubRegistrar::sharing_counters_with(registrar)),
        Box::new(StubEdgeDns::sharing_counters_with(edge)),
        config,
    )
    .expect("engine construction succeeds")
}

#[tokio::test]
async fn cold_start_creates_but_never_removes() {
    let registrar = StubRegistrar::new(&["b.com", "c.com"]);
    let edge = StubEdgeDns::new(&["a.com", "b.com"]);
    let (mut engine, _events) = engine_for(&registrar, &edge, minimal_config());

    let report = engine.run_cycle().await.expect("cycle succeeds");

    assert_eq!(report.new_zones, vec!["c.com".to_string()]);
    assert!(report.removed_zones.is_empty());
    assert_eq!(report.created, 1);
    assert_eq!(edge.delete_call_count(), 0);
    assert_eq!(edge.zones(), vec!["a.com", "b.com", "c.com"]);

    let created = edge.created();
    assert_eq!(created[0].zone, "c.com");
    assert_eq!(created[0].zone_type, ZoneType::Secondary);
    assert_eq!(created[0].masters, vec!["192.0.2.53", "198.51.100.53"]);
    assert_eq!(created[0].comment, "Created by EdgeDNS Registrar Coordinator");
}

#[tokio::test]
async fn second_cycle_with_same_inputs_is_a_no_op() {
    let registrar = StubRegistrar::new(&["b.com", "c.com"]);
    let edge = StubEdgeDns::new(&["a.com", "b.com"]);
    let (mut engine, _events) = engine_for(&registrar, &edge, minimal_config());

    engine.run_cycle().await.expect("first cycle succeeds");
    let second = engine.run_cycle().await.expect("second cycle succeeds");

    assert!(second.new_zones.is_empty());
    assert!(second.removed_zones.is_empty());
    assert_eq!(edge.create_call_count(), 1);
    assert_eq!(edge.delete_call_count(), 0);
}

#[tokio::test]
async fn zone_dropped_by_registrar_is_removed_next_cycle() {
    let registrar = StubRegistrar::new(&["d.com", "e.com"]);
    let edge = StubEdgeDns::new(&["d.com", "e.com", "manual.com"]);
    let (mut engine, _events) = engine_for(&registrar, &edge, minimal_config());

    engine.run_cycle().await.expect("baseline cycle succeeds");
    registrar.set_domains(&["e.com"]);
    let report = engine.run_cycle().await.expect("second cycle succeeds");

    assert_eq!(report.removed_zones, vec!["d.com".to_string()]);
    assert_eq!(report.removed, 1);
    assert_eq!(edge.deleted(), vec![vec!["d.com".to_string()]]);
    // Never claimed by the registrar, so never touched
    assert_eq!(edge.zones(), vec!["e.com", "manual.com"]);
}

#[tokio::test]
async fn removals_are_one_bulk_call() {
    let registrar = StubRegistrar::new(&["a.com", "b.com", "c.com"]);
    let edge = StubEdgeDns::new(&["a.com", "b.com", "c.com"]);
    let (mut engine, _events) = engine_for(&registrar, &edge, minimal_config());

    engine.run_cycle().await.expect("baseline cycle succeeds");
    registrar.set_domains(&[]);
    engine.run_cycle().await.expect("second cycle succeeds");

    assert_eq!(edge.delete_call_count(), 1);
    let mut deleted = edge.deleted().remove(0);
    deleted.sort();
    assert_eq!(deleted, vec!["a.com", "b.com", "c.com"]);
}

#[tokio::test]
async fn tsig_lookup_failure_still_creates_zone() {
    let registrar = StubRegistrar::new(&["a.com"]);
    registrar.fail_tsig(true);
    let edge = StubEdgeDns::new(&[]);
    let mut config = minimal_config();
    config.tsig = true;
    let (mut engine, _events) = engine_for(&registrar, &edge, config);

    let report = engine.run_cycle().await.expect("cycle succeeds");

    assert_eq!(report.created, 1);
    assert_eq!(report.failures, 0);
    assert_eq!(registrar.tsig_call_count(), 1);
    assert!(edge.created()[0].tsig_key.is_none());
}

#[tokio::test]
async fn dnssec_and_tsig_metadata_are_attached() {
    let registrar = StubRegistrar::new(&["a.com"]);
    registrar.set_algorithm("RSA_SHA256");
    let edge = StubEdgeDns::new(&[]);
    let mut config = minimal_config();
    config.dnssec = true;
    config.tsig = true;
    let (mut engine, _events) = engine_for(&registrar, &edge, config);

    engine.run_cycle().await.expect("cycle succeeds");

    let created = edge.created();
    assert!(created[0].sign_and_serve);
    assert_eq!(created[0].sign_and_serve_algorithm.as_deref(), Some("RSA_SHA256"));
    assert_eq!(
        created[0].tsig_key.as_ref().map(|k| k.name.as_str()),
        Some("xfr.a.com")
    );
}

#[tokio::test]
async fn metadata_is_not_looked_up_when_disabled() {
    let registrar = StubRegistrar::new(&["a.com"]);
    registrar.set_algorithm("RSA_SHA256");
    let edge = StubEdgeDns::new(&[]);
    let (mut engine, _events) = engine_for(&registrar, &edge, minimal_config());

    engine.run_cycle().await.expect("cycle succeeds");

    assert_eq!(registrar.tsig_call_count(), 0);
    assert!(!edge.created()[0].sign_and_serve);
}

#[tokio::test]
async fn create_failure_does_not_block_remove_step() {
    let registrar = StubRegistrar::new(&["old.com"]);
    let edge = StubEdgeDns::new(&["old.com"]);
    let (mut engine, _events) = engine_for(&registrar, &edge, minimal_config());

    engine.run_cycle().await.expect("baseline cycle succeeds");
    registrar.set_domains(&["new.com"]);
    registrar.fail_masters(true);
    let report = engine.run_cycle().await.expect("cycle tolerates failures");

    assert_eq!(report.created, 0);
    assert_eq!(report.failures, 1);
    assert_eq!(edge.create_call_count(), 0);
    assert_eq!(edge.deleted(), vec![vec!["old.com".to_string()]]);
}

#[tokio::test]
async fn failed_zone_does_not_stop_the_batch() {
    let registrar = StubRegistrar::new(&["a.com", "b.com", "c.com"]);
    let edge = StubEdgeDns::new(&[]);
    edge.fail_create_for("b.com");
    let (mut engine, _events) = engine_for(&registrar, &edge, minimal_config());

    let report = engine.run_cycle().await.expect("cycle tolerates failures");

    assert_eq!(edge.create_call_count(), 3);
    assert_eq!(report.created, 2);
    assert_eq!(report.failures, 1);
    assert_eq!(edge.zones(), vec!["a.com", "c.com"]);
}

#[tokio::test]
async fn master_ips_are_fetched_once_per_batch() {
    let registrar = StubRegistrar::new(&["a.com", "b.com", "c.com"]);
    let edge = StubEdgeDns::new(&[]);
    let (mut engine, _events) = engine_for(&registrar, &edge, minimal_config());

    engine.run_cycle().await.expect("cycle succeeds");
    engine.run_cycle().await.expect("cycle succeeds");

    // Second cycle has nothing to create
    assert_eq!(registrar.masters_call_count(), 1);
}

#[tokio::test]
async fn cycle_events_are_emitted_in_order() {
    let registrar = StubRegistrar::new(&["a.com"]);
    let edge = StubEdgeDns::new(&[]);
    let (mut engine, mut events) = engine_for(&registrar, &edge, minimal_config());

    engine.run_cycle().await.expect("cycle succeeds");

    let mut received = Vec::new();
    while let Ok(event) = events.try_recv() {
        received.push(event);
    }
    assert_eq!(
        received,
        vec![
            EngineEvent::CycleStarted { cycle: 1 },
            EngineEvent::ZonesDiffed {
                new_zones: 1,
                removed_zones: 0,
            },
            EngineEvent::ZoneCreated {
                zone: "a.com".to_string(),
                signed: false,
                tsig: false,
            },
            EngineEvent::CycleCompleted {
                cycle: 1,
                created: 1,
                removed: 0,
                failures: 0,
            },
        ]
    );
}
