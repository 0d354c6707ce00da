//! Zone mutator
//!
//! Applies the output of a diff to Edge DNS.
//!
//! ## Create path
//!
//! Master addresses are fetched once per batch; without them no creation
//! record can be built, so a failed lookup aborts the whole batch. Zones are
//! then created strictly one at a time. DNSSEC and TSIG lookups are
//! best-effort: a failure downgrades that zone to "created without the
//! feature" and logs a warning.
//!
//! ## Remove path
//!
//! All removed zones go out in a single bulk deletion. There is no per-zone
//! fallback.
//!
//! Dry run computes and logs everything but never calls `create_zone` or
//! `delete_bulk_zones`.

use tracing::{debug, error, info, warn};

use crate::config::SyncConfig;
use crate::engine::events::{EngineEvent, EventEmitter};
use crate::error::Result;
use crate::traits::{EdgeDnsProvider, Registrar, ZoneCreate, ZonePlacement};

/// Policy flags that shape a mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationPolicy {
    /// Log instead of calling Edge DNS
    pub dry_run: bool,
    /// Abort the batch on the first creation failure
    pub fail_on_error: bool,
    /// Look up a signing algorithm per zone
    pub dnssec: bool,
    /// Look up a TSIG key per zone
    pub tsig: bool,
    /// Comment attached to created zones
    pub zone_comment: String,
}

impl From<&SyncConfig> for MutationPolicy {
    fn from(config: &SyncConfig) -> Self {
        Self {
            dry_run: config.dry_run,
            fail_on_error: config.fail_on_error,
            dnssec: config.dnssec,
            tsig: config.tsig,
            zone_comment: config.zone_comment.clone(),
        }
    }
}

/// Result of a create batch that ran to the end
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateSummary {
    /// Zones created on Edge DNS
    pub created: Vec<String>,
    /// Zones that would have been created (dry run)
    pub skipped: Vec<String>,
    /// Zones whose creation failed, with the error message
    pub failed: Vec<(String, String)>,
}

/// Result of a remove step that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoveSummary {
    /// Nothing to remove
    Nothing,
    /// Bulk deletion submitted for these zones
    Removed(Vec<String>),
    /// Dry run; these zones would have been removed
    Skipped(Vec<String>),
}

impl RemoveSummary {
    /// Number of zones actually submitted for deletion
    pub fn removed_count(&self) -> usize {
        match self {
            RemoveSummary::Removed(zones) => zones.len(),
            _ => 0,
        }
    }
}

/// Applies creates and removes against one registrar/Edge DNS pair
pub struct ZoneMutator<'a> {
    registrar: &'a dyn Registrar,
    edge_dns: &'a dyn EdgeDnsProvider,
    placement: &'a ZonePlacement,
    policy: &'a MutationPolicy,
    events: &'a EventEmitter,
}

impl<'a> ZoneMutator<'a> {
    pub fn new(
        registrar: &'a dyn Registrar,
        edge_dns: &'a dyn EdgeDnsProvider,
        placement: &'a ZonePlacement,
        policy: &'a MutationPolicy,
        events: &'a EventEmitter,
    ) -> Self {
        Self {
            registrar,
            edge_dns,
            placement,
            policy,
            events,
        }
    }

    /// Create secondary zones for every name in `new_zones`
    ///
    /// # Errors
    ///
    /// - The master address lookup failed (nothing was created)
    /// - A creation failed while `fail_on_error` is set (remaining zones
    ///   were not attempted)
    pub async fn add_secondary_zones(&self, new_zones: &[String]) -> Result<CreateSummary> {
        let mut summary = CreateSummary::default();
        if new_zones.is_empty() {
            return Ok(summary);
        }

        let masters = self.registrar.get_master_ips().await.inspect_err(|e| {
            error!(
                "Failed to fetch master IPs from {}: {}",
                self.registrar.registrar_name(),
                e
            )
        })?;
        debug!("Using masters {:?} for {} new zone(s)", masters, new_zones.len());

        for zone in new_zones {
            let record = self.build_record(zone, &masters).await;

            if self.policy.dry_run {
                info!(
                    "[dry run] Would create zone {} (sign_and_serve: {}, tsig: {})",
                    zone,
                    record.sign_and_serve,
                    record.tsig_key.is_some()
                );
                self.events.emit(EngineEvent::ZoneCreateSkipped { zone: zone.clone() });
                summary.skipped.push(zone.clone());
                continue;
            }

            match self.edge_dns.create_zone(&record, self.placement).await {
                Ok(()) => {
                    info!("Created secondary zone {}", zone);
                    self.events.emit(EngineEvent::ZoneCreated {
                        zone: zone.clone(),
                        signed: record.sign_and_serve,
                        tsig: record.tsig_key.is_some(),
                    });
                    summary.created.push(zone.clone());
                }
                Err(e) => {
                    error!("Failed to create zone {}: {}", zone, e);
                    self.events.emit(EngineEvent::ZoneCreateFailed {
                        zone: zone.clone(),
                        error: e.to_string(),
                    });
                    if self.policy.fail_on_error {
                        return Err(e);
                    }
                    summary.failed.push((zone.clone(), e.to_string()));
                }
            }
        }

        Ok(summary)
    }

    /// Submit one bulk deletion for `removed_zones`
    ///
    /// # Errors
    ///
    /// Returns the Edge DNS error if the bulk deletion failed.
    pub async fn remove_secondary_zones(&self, removed_zones: &[String]) -> Result<RemoveSummary> {
        if removed_zones.is_empty() {
            return Ok(RemoveSummary::Nothing);
        }

        if self.policy.dry_run {
            info!("[dry run] Would remove zones {:?}", removed_zones);
            self.events.emit(EngineEvent::ZoneRemovalSkipped {
                zones: removed_zones.to_vec(),
            });
            return Ok(RemoveSummary::Skipped(removed_zones.to_vec()));
        }

        match self.edge_dns.delete_bulk_zones(removed_zones).await {
            Ok(()) => {
                info!("Submitted removal of {} zone(s): {:?}", removed_zones.len(), removed_zones);
                self.events.emit(EngineEvent::ZonesRemoved {
                    zones: removed_zones.to_vec(),
                });
                Ok(RemoveSummary::Removed(removed_zones.to_vec()))
            }
            Err(e) => {
                error!("Failed to remove zones {:?}: {}", removed_zones, e);
                self.events.emit(EngineEvent::ZoneRemovalFailed {
                    zones: removed_zones.to_vec(),
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn build_record(&self, zone: &str, masters: &[String]) -> ZoneCreate {
        let mut record = ZoneCreate::secondary(zone, masters.to_vec())
            .with_comment(self.policy.zone_comment.clone());

        if self.policy.dnssec {
            match self.registrar.get_serve_algorithm(zone).await {
                Ok(algorithm) if !algorithm.is_empty() => {
                    record = record.with_sign_and_serve(algorithm);
                }
                Ok(_) => {
                    warn!("No signing algorithm known for {}, creating it unsigned", zone);
                }
                Err(e) => {
                    warn!(
                        "Failed to fetch signing algorithm for {}, creating it unsigned: {}",
                        zone, e
                    );
                }
            }
        }

        if self.policy.tsig {
            match self.registrar.get_tsig_key(zone).await {
                Ok(Some(key)) => {
                    record = record.with_tsig_key(key);
                }
                Ok(None) => {
                    warn!("No TSIG key known for {}, creating it without one", zone);
                }
                Err(e) => {
                    warn!(
                        "Failed to fetch TSIG key for {}, creating it without one: {}",
                        zone, e
                    );
                }
            }
        }

        record
    }
}
