//! Test doubles and common utilities for reconciliation contract tests
//!
//! The doubles keep their state behind `Arc`s so a test can hand one copy to
//! the engine (which takes ownership) and keep another for assertions and for
//! changing what the backend reports between cycles.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use zonesync_core::error::{Error, Result};
use zonesync_core::traits::{EdgeDnsProvider, Registrar, TsigKey, ZoneCreate, ZonePlacement};
use zonesync_core::SyncConfig;

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// A registrar with a controllable domain list
pub struct StubRegistrar {
    domains: Arc<Mutex<Vec<String>>>,
    fail_domains: Arc<AtomicBool>,
    fail_masters: Arc<AtomicBool>,
    fail_tsig: Arc<AtomicBool>,
    algorithm: Arc<Mutex<String>>,
    /// Call counter for get_domains()
    domains_call_count: Arc<AtomicUsize>,
    /// Call counter for get_master_ips()
    masters_call_count: Arc<AtomicUsize>,
    /// Call counter for get_tsig_key()
    tsig_call_count: Arc<AtomicUsize>,
}

impl StubRegistrar {
    pub fn new(domains: &[&str]) -> Self {
        Self {
            domains: Arc::new(Mutex::new(names(domains))),
            fail_domains: Arc::new(AtomicBool::new(false)),
            fail_masters: Arc::new(AtomicBool::new(false)),
            fail_tsig: Arc::new(AtomicBool::new(false)),
            algorithm: Arc::new(Mutex::new(String::new())),
            domains_call_count: Arc::new(AtomicUsize::new(0)),
            masters_call_count: Arc::new(AtomicUsize::new(0)),
            tsig_call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a new StubRegistrar that shares state with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            domains: Arc::clone(&other.domains),
            fail_domains: Arc::clone(&other.fail_domains),
            fail_masters: Arc::clone(&other.fail_masters),
            fail_tsig: Arc::clone(&other.fail_tsig),
            algorithm: Arc::clone(&other.algorithm),
            domains_call_count: Arc::clone(&other.domains_call_count),
            masters_call_count: Arc::clone(&other.masters_call_count),
            tsig_call_count: Arc::clone(&other.tsig_call_count),
        }
    }

    pub fn set_domains(&self, domains: &[&str]) {
        *self.domains.lock().unwrap() = names(domains);
    }

    pub fn fail_domains(&self, fail: bool) {
        self.fail_domains.store(fail, Ordering::SeqCst);
    }

    pub fn fail_masters(&self, fail: bool) {
        self.fail_masters.store(fail, Ordering::SeqCst);
    }

    pub fn fail_tsig(&self, fail: bool) {
        self.fail_tsig.store(fail, Ordering::SeqCst);
    }

    pub fn set_algorithm(&self, algorithm: &str) {
        *self.algorithm.lock().unwrap() = algorithm.to_string();
    }

    pub fn domains_call_count(&self) -> usize {
        self.domains_call_count.load(Ordering::SeqCst)
    }

    pub fn masters_call_count(&self) -> usize {
        self.masters_call_count.load(Ordering::SeqCst)
    }

    pub fn tsig_call_count(&self) -> usize {
        self.tsig_call_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Registrar for StubRegistrar {
    async fn get_domains(&self) -> Result<Vec<String>> {
        self.domains_call_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_domains.load(Ordering::SeqCst) {
            return Err(Error::registrar("domain list unavailable"));
        }
        Ok(self.domains.lock().unwrap().clone())
    }

    async fn get_master_ips(&self) -> Result<Vec<String>> {
        self.masters_call_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_masters.load(Ordering::SeqCst) {
            return Err(Error::registrar("authorities unavailable"));
        }
        Ok(names(&["192.0.2.53", "198.51.100.53"]))
    }

    async fn get_serve_algorithm(&self, _domain: &str) -> Result<String> {
        Ok(self.algorithm.lock().unwrap().clone())
    }

    async fn get_tsig_key(&self, domain: &str) -> Result<Option<TsigKey>> {
        self.tsig_call_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_tsig.load(Ordering::SeqCst) {
            return Err(Error::registrar(format!("no TSIG key for {domain}")));
        }
        Ok(Some(TsigKey::new(
            format!("xfr.{domain}"),
            "hmac-sha256",
            "c2VjcmV0",
        )))
    }

    fn registrar_name(&self) -> &'static str {
        "stub"
    }
}

/// An Edge DNS provider backed by an in-memory zone set
///
/// Created zones are added to the set and deleted zones removed, so
/// consecutive cycles observe the effect of earlier mutations.
pub struct StubEdgeDns {
    zones: Arc<Mutex<Vec<String>>>,
    fail_list: Arc<AtomicBool>,
    fail_create: Arc<Mutex<Vec<String>>>,
    fail_delete: Arc<AtomicBool>,
    /// Simulated latency of get_zone_names()
    list_delay: Arc<Mutex<Duration>>,
    /// Every creation record received
    created: Arc<Mutex<Vec<ZoneCreate>>>,
    /// Every bulk deletion received
    deleted: Arc<Mutex<Vec<Vec<String>>>>,
    /// Call counter for get_zone_names()
    list_call_count: Arc<AtomicUsize>,
    /// Call counter for create_zone()
    create_call_count: Arc<AtomicUsize>,
    /// Call counter for delete_bulk_zones()
    delete_call_count: Arc<AtomicUsize>,
}

impl StubEdgeDns {
    pub fn new(zones: &[&str]) -> Self {
        Self {
            zones: Arc::new(Mutex::new(names(zones))),
            fail_list: Arc::new(AtomicBool::new(false)),
            fail_create: Arc::new(Mutex::new(Vec::new())),
            fail_delete: Arc::new(AtomicBool::new(false)),
            list_delay: Arc::new(Mutex::new(Duration::ZERO)),
            created: Arc::new(Mutex::new(Vec::new())),
            deleted: Arc::new(Mutex::new(Vec::new())),
            list_call_count: Arc::new(AtomicUsize::new(0)),
            create_call_count: Arc::new(AtomicUsize::new(0)),
            delete_call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a new StubEdgeDns that shares state with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            zones: Arc::clone(&other.zones),
            fail_list: Arc::clone(&other.fail_list),
            fail_create: Arc::clone(&other.fail_create),
            fail_delete: Arc::clone(&other.fail_delete),
            list_delay: Arc::clone(&other.list_delay),
            created: Arc::clone(&other.created),
            deleted: Arc::clone(&other.deleted),
            list_call_count: Arc::clone(&other.list_call_count),
            create_call_count: Arc::clone(&other.create_call_count),
            delete_call_count: Arc::clone(&other.delete_call_count),
        }
    }

    pub fn fail_list(&self, fail: bool) {
        self.fail_list.store(fail, Ordering::SeqCst);
    }

    pub fn fail_create_for(&self, zone: &str) {
        self.fail_create.lock().unwrap().push(zone.to_string());
    }

    pub fn fail_delete(&self, fail: bool) {
        self.fail_delete.store(fail, Ordering::SeqCst);
    }

    /// Make every zone listing take `delay` (tokio time)
    pub fn set_list_delay(&self, delay: Duration) {
        *self.list_delay.lock().unwrap() = delay;
    }

    pub fn zones(&self) -> Vec<String> {
        let mut zones = self.zones.lock().unwrap().clone();
        zones.sort();
        zones
    }

    pub fn created(&self) -> Vec<ZoneCreate> {
        self.created.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<Vec<String>> {
        self.deleted.lock().unwrap().clone()
    }

    pub fn list_call_count(&self) -> usize {
        self.list_call_count.load(Ordering::SeqCst)
    }

    pub fn create_call_count(&self) -> usize {
        self.create_call_count.load(Ordering::SeqCst)
    }

    pub fn delete_call_count(&self) -> usize {
        self.delete_call_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl EdgeDnsProvider for StubEdgeDns {
    async fn get_zone_names(&self, _filter_out_states: &[String]) -> Result<Vec<String>> {
        self.list_call_count.fetch_add(1, Ordering::SeqCst);
        let delay = *self.list_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(Error::edge_dns("zone listing unavailable"));
        }
        Ok(self.zones.lock().unwrap().clone())
    }

    async fn create_zone(&self, zone: &ZoneCreate, _placement: &ZonePlacement) -> Result<()> {
        self.create_call_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_create.lock().unwrap().contains(&zone.zone) {
            return Err(Error::edge_dns(format!("zone {} rejected", zone.zone)));
        }
        self.created.lock().unwrap().push(zone.clone());
        self.zones.lock().unwrap().push(zone.zone.clone());
        Ok(())
    }

    async fn delete_bulk_zones(&self, zones: &[String]) -> Result<()> {
        self.delete_call_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(Error::edge_dns("bulk delete rejected"));
        }
        self.deleted.lock().unwrap().push(zones.to_vec());
        self.zones.lock().unwrap().retain(|z| !zones.contains(z));
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "stub"
    }
}

/// Helper to create a minimal SyncConfig for testing
pub fn minimal_config() -> SyncConfig {
    let mut config = SyncConfig::new("test", ZonePlacement::new("C-TEST", 42));
    config.event_channel_capacity = 100;
    config
}
