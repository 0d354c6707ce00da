//! Reconciliation loop
//!
//! The ZoneSyncEngine is responsible for:
//! - Fetching the edge zone set and the registrar domain set every interval
//! - Diffing them against the tally remembered from the previous cycle
//! - Creating and removing secondary zones via the ZoneMutator
//! - Reporting exactly one terminal [`Outcome`] to its caller
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   get_domains    ┌──────────────────┐   get_zone_names   ┌─────────────────┐
//! │  Registrar  │ ───────────────▶ │  ZoneSyncEngine  │ ◀───────────────── │ EdgeDnsProvider │
//! └─────────────┘                  └──────────────────┘                    └─────────────────┘
//!                                           │                                       ▲
//!                  ┌────────────────────────┼────────────────────────┐              │
//!                  ▼                        ▼                        ▼              │
//!          ┌──────────────┐         ┌──────────────┐         ┌─────────────┐        │
//!          │  TallyStore  │         │ ZoneMutator  │ ──────▶ │   Events    │        │
//!          │  (diff)      │         │ (add/remove) │         │  (notify)   │        │
//!          └──────────────┘         └──────────────┘         └─────────────┘        │
//!                                           └───────── create / bulk delete ────────┘
//! ```
//!
//! ## Cycle
//!
//! 1. Record the next wake time (now + interval) before any I/O
//! 2. Fetch edge zones and registrar domains
//! 3. On a fetch failure: terminate if fail-fast, else skip to sleep
//! 4. Diff, create path, remove path
//! 5. With `once`, terminate
//! 6. Sleep until the wake time (immediately if it has passed)
//!
//! Cancellation is observed at the start of every cycle and while sleeping,
//! never in the middle of a backend call. Backend clients bound their own
//! calls with request timeouts.

pub mod events;

use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, error, info, warn};

use crate::config::SyncConfig;
use crate::error::{Error, FetchSide, Result};
use crate::mutator::{MutationPolicy, ZoneMutator};
use crate::state::TallyStore;
use crate::traits::{EdgeDnsProvider, Registrar};

pub use events::{EngineEvent, EventEmitter};

/// Terminal result of a reconciliation loop, delivered exactly once
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// `once` was set and the cycle completed
    Finished,
    /// The shutdown signal fired
    Cancelled,
    /// A fail-fast error ended the loop
    Failed { reason: String },
}

impl Outcome {
    /// Clean termination
    pub fn is_success(&self) -> bool {
        !matches!(self, Outcome::Failed { .. })
    }

    /// Failure description, empty for clean termination
    pub fn message(&self) -> &str {
        match self {
            Outcome::Failed { reason } => reason,
            _ => "",
        }
    }
}

/// What a single cycle did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Backend whose listing failed; diff and mutation were skipped
    pub fetch_failed: Option<FetchSide>,
    /// Zones the diff asked to create
    pub new_zones: Vec<String>,
    /// Zones the diff asked to remove
    pub removed_zones: Vec<String>,
    /// Zones created on Edge DNS
    pub created: usize,
    /// Zones submitted for bulk deletion
    pub removed: usize,
    /// Errors logged and tolerated during this cycle
    pub failures: usize,
}

/// Core reconciliation engine
///
/// ## Lifecycle
///
/// 1. Create with [`ZoneSyncEngine::new()`]
/// 2. Run with [`ZoneSyncEngine::run_with_shutdown()`] or [`ZoneSyncEngine::spawn()`]
/// 3. The engine runs until `once` completes, a fail-fast error occurs or the
///    shutdown signal fires
///
/// ## Threading
///
/// The loop is a single sequential task. The tally is owned by the engine and
/// only touched from that task.
pub struct ZoneSyncEngine {
    /// System of record for domains
    registrar: Box<dyn Registrar>,

    /// Secondary DNS hosting provider
    edge_dns: Box<dyn EdgeDnsProvider>,

    /// Loop configuration
    config: SyncConfig,

    /// Derived from `config`
    policy: MutationPolicy,

    /// Time between the start of two cycles
    interval: Duration,

    /// Registrar tally from the previous cycle
    tally: TallyStore,

    /// Number of cycles started
    cycles: u64,

    /// Event sender for external monitoring
    events: EventEmitter,
}

impl ZoneSyncEngine {
    /// Create a new engine
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields engine events
    pub fn new(
        registrar: Box<dyn Registrar>,
        edge_dns: Box<dyn EdgeDnsProvider>,
        config: SyncConfig,
    ) -> Result<(Self, tokio::sync::mpsc::Receiver<EngineEvent>)> {
        config.validate()?;

        let (events, rx) = EventEmitter::channel(config.event_channel_capacity);

        let engine = Self {
            registrar,
            edge_dns,
            policy: MutationPolicy::from(&config),
            interval: config.interval(),
            config,
            tally: TallyStore::new(),
            cycles: 0,
            events,
        };

        Ok((engine, rx))
    }

    /// Override the cycle interval
    ///
    /// Allows sub-second intervals, which the configuration does not.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Instance key of this engine's tally
    pub fn instance(&self) -> &str {
        &self.config.instance
    }

    /// Tally remembered from the most recent diff
    pub fn tally(&self) -> &TallyStore {
        &self.tally
    }

    /// Run until `once` completes or a fail-fast error occurs
    pub async fn run(&mut self) -> Outcome {
        self.run_with_shutdown(None).await
    }

    /// Run until `once` completes, a fail-fast error occurs or `shutdown`
    /// fires
    ///
    /// Dropping the sender of `shutdown` counts as a shutdown request.
    pub async fn run_with_shutdown(&mut self, mut shutdown: Option<oneshot::Receiver<()>>) -> Outcome {
        info!(
            "Starting reconciliation loop for instance '{}' ({} -> {}, every {:?}{})",
            self.config.instance,
            self.registrar.registrar_name(),
            self.edge_dns.provider_name(),
            self.interval,
            if self.config.dry_run { ", dry run" } else { "" }
        );
        self.events.emit(EngineEvent::Started {
            instance: self.config.instance.clone(),
            interval_secs: self.interval.as_secs(),
            dry_run: self.config.dry_run,
        });

        let outcome = loop {
            if shutdown_requested(&mut shutdown) {
                break Outcome::Cancelled;
            }

            let next_wake = wake_time(Instant::now(), self.interval);

            if let Err(e) = self.run_cycle().await {
                error!("Reconciliation loop terminated: {}", e);
                break Outcome::Failed {
                    reason: e.to_string(),
                };
            }

            if self.config.once {
                break Outcome::Finished;
            }

            debug!(
                "Sleeping {:?} until next cycle",
                next_wake.saturating_duration_since(Instant::now())
            );
            match shutdown.as_mut() {
                Some(rx) => {
                    tokio::select! {
                        _ = sleep_until(next_wake) => {}
                        _ = rx => break Outcome::Cancelled,
                    }
                }
                None => sleep_until(next_wake).await,
            }
        };

        let reason = match &outcome {
            Outcome::Finished => "Single cycle completed".to_string(),
            Outcome::Cancelled => "Shutdown signal".to_string(),
            Outcome::Failed { reason } => reason.clone(),
        };
        info!("Reconciliation loop stopped: {}", reason);
        self.events.emit(EngineEvent::Stopped { reason });

        outcome
    }

    /// Run a single reconciliation cycle
    ///
    /// Tolerated errors are logged and counted in the report.
    ///
    /// # Errors
    ///
    /// Only when `fail_on_error` is set: the first fetch, create or remove
    /// failure.
    pub async fn run_cycle(&mut self) -> Result<CycleReport> {
        self.cycles += 1;
        let cycle = self.cycles;
        let mut report = CycleReport::default();
        debug!("Starting cycle {} for instance '{}'", cycle, self.config.instance);
        self.events.emit(EngineEvent::CycleStarted { cycle });

        let edge_zones = self
            .edge_dns
            .get_zone_names(&self.config.filter_out_states)
            .await;
        let registrar_domains = self.registrar.get_domains().await;

        let (edge_zones, registrar_domains) = match (edge_zones, registrar_domains) {
            (Ok(edge), Ok(registrar)) => (edge, registrar),
            (edge, registrar) => {
                // Edge listing failures are reported first
                let failures = [
                    (FetchSide::EdgeDns, edge.err()),
                    (FetchSide::Registrar, registrar.err()),
                ];
                for (side, err) in failures {
                    let Some(err) = err else { continue };
                    let err = Error::fetch(side, err);
                    error!("Cycle {}: {}", cycle, err);
                    self.events.emit(EngineEvent::FetchFailed {
                        side,
                        error: err.to_string(),
                    });
                    if self.config.fail_on_error {
                        return Err(err);
                    }
                    report.failures += 1;
                    report.fetch_failed.get_or_insert(side);
                }
                warn!("Cycle {}: skipping diff until the next interval", cycle);
                self.complete_cycle(cycle, &report);
                return Ok(report);
            }
        };

        let diff =
            self.tally
                .diff_and_remember(&self.config.instance, &edge_zones, &registrar_domains);
        info!(
            "Cycle {}: {} edge zone(s), {} registrar domain(s), {} to create, {} to remove",
            cycle,
            edge_zones.len(),
            registrar_domains.len(),
            diff.new_zones.len(),
            diff.removed_zones.len()
        );
        self.events.emit(EngineEvent::ZonesDiffed {
            new_zones: diff.new_zones.len(),
            removed_zones: diff.removed_zones.len(),
        });

        let mutator = ZoneMutator::new(
            self.registrar.as_ref(),
            self.edge_dns.as_ref(),
            &self.config.placement,
            &self.policy,
            &self.events,
        );

        match mutator.add_secondary_zones(&diff.new_zones).await {
            Ok(summary) => {
                report.created = summary.created.len();
                report.failures += summary.failed.len();
            }
            Err(e) if self.config.fail_on_error => return Err(e),
            Err(e) => {
                warn!("Cycle {}: create step failed, continuing: {}", cycle, e);
                report.failures += 1;
            }
        }

        match mutator.remove_secondary_zones(&diff.removed_zones).await {
            Ok(summary) => report.removed = summary.removed_count(),
            Err(e) if self.config.fail_on_error => return Err(e),
            Err(e) => {
                warn!("Cycle {}: remove step failed, continuing: {}", cycle, e);
                report.failures += 1;
            }
        }

        report.new_zones = diff.new_zones;
        report.removed_zones = diff.removed_zones;
        self.complete_cycle(cycle, &report);
        Ok(report)
    }

    /// Run the loop on its own task
    ///
    /// Returns the task handle and a receiver that yields the single
    /// terminal [`Outcome`].
    pub fn spawn(
        mut self,
        shutdown: Option<oneshot::Receiver<()>>,
    ) -> (tokio::task::JoinHandle<()>, oneshot::Receiver<Outcome>) {
        let (outcome_tx, outcome_rx) = oneshot::channel();
        let handle = tokio::spawn(async move {
            let outcome = self.run_with_shutdown(shutdown).await;
            if outcome_tx.send(outcome).is_err() {
                debug!("Outcome receiver dropped before the loop terminated");
            }
        });
        (handle, outcome_rx)
    }

    fn complete_cycle(&self, cycle: u64, report: &CycleReport) {
        self.events.emit(EngineEvent::CycleCompleted {
            cycle,
            created: report.created,
            removed: report.removed,
            failures: report.failures,
        });
    }
}

/// `now + interval`, clamped to a far-future instant on overflow
fn wake_time(now: Instant, interval: Duration) -> Instant {
    now.checked_add(interval)
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now)
}

/// Roughly thirty years
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// Non-blocking check for a pending shutdown request
fn shutdown_requested(shutdown: &mut Option<oneshot::Receiver<()>>) -> bool {
    match shutdown.as_mut() {
        Some(rx) => !matches!(rx.try_recv(), Err(oneshot::error::TryRecvError::Empty)),
        None => false,
    }
}
