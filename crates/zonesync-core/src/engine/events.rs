//! Engine events
//!
//! Typed notifications for external monitoring, delivered over a bounded
//! channel. Events are informational only: dropping them never changes what
//! the engine does.

use tokio::sync::mpsc;
use tracing::warn;

use crate::error::FetchSide;

/// Events emitted by the ZoneSyncEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Engine started
    Started {
        instance: String,
        interval_secs: u64,
        dry_run: bool,
    },

    /// A reconciliation cycle began
    CycleStarted { cycle: u64 },

    /// A backend listing failed; diff and mutation are skipped this cycle
    FetchFailed { side: FetchSide, error: String },

    /// Diff computed
    ZonesDiffed {
        new_zones: usize,
        removed_zones: usize,
    },

    /// Zone created on Edge DNS
    ZoneCreated { zone: String, signed: bool, tsig: bool },

    /// Zone creation failed
    ZoneCreateFailed { zone: String, error: String },

    /// Zone creation skipped (dry run)
    ZoneCreateSkipped { zone: String },

    /// Bulk deletion submitted
    ZonesRemoved { zones: Vec<String> },

    /// Bulk deletion skipped (dry run)
    ZoneRemovalSkipped { zones: Vec<String> },

    /// Bulk deletion failed
    ZoneRemovalFailed { zones: Vec<String>, error: String },

    /// A reconciliation cycle finished
    CycleCompleted {
        cycle: u64,
        created: usize,
        removed: usize,
        failures: usize,
    },

    /// Engine stopped
    Stopped { reason: String },
}

/// Sending half of the event channel
///
/// Uses `try_send` so a slow consumer never blocks the loop.
#[derive(Debug, Clone)]
pub struct EventEmitter {
    tx: mpsc::Sender<EngineEvent>,
}

impl EventEmitter {
    /// Create an emitter and the matching receiver
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<EngineEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    /// Emit an event, dropping it if the channel is full
    pub fn emit(&self, event: EngineEvent) {
        match self.tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(
                    "Event channel full, dropping event. Consider increasing event_channel_capacity."
                );
            }
            // Nobody is listening; that is allowed
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    }
}
