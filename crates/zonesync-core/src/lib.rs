// # zonesync-core
//
// Core library for keeping an Edge DNS secondary zone set in step with a
// registrar's domain list.
//
// ## Architecture Overview
//
// - **Registrar**: Trait for the system of record for primary domains
// - **EdgeDnsProvider**: Trait for the secondary DNS hosting provider
// - **diff_zones**: Pure set difference deciding creates and removes
// - **TallyStore**: Registrar domain set remembered from the previous cycle
// - **ZoneMutator**: Applies creates (one by one) and removes (one bulk call)
// - **ZoneSyncEngine**: Poll, diff, mutate, sleep; reports one terminal outcome
// - **BackendRegistry**: Compiled-in registry of backend factories
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Reconciliation logic knows nothing about
//    HTTP, files or credentials
// 2. **No Destructive Cold Start**: Zones are only removed after the
//    registrar has been seen claiming them in the previous cycle
// 3. **Best-Effort Mutations**: Each create and the bulk delete are
//    independent calls; fail-fast is opt-in
// 4. **Library-First**: The daemon is a thin wrapper around this crate

pub mod config;
pub mod diff;
pub mod engine;
pub mod error;
pub mod mutator;
pub mod registry;
pub mod state;
pub mod traits;

// Re-export core types for convenience
pub use config::{CoordinatorConfig, EdgeDnsConfig, EdgeGridSettings, RegistrarConfig, SyncConfig};
pub use diff::{ZoneDiff, diff_zones};
pub use engine::{CycleReport, EngineEvent, Outcome, ZoneSyncEngine};
pub use error::{Error, FetchSide, Result};
pub use mutator::{CreateSummary, MutationPolicy, RemoveSummary, ZoneMutator};
pub use registry::BackendRegistry;
pub use state::TallyStore;
pub use traits::{
    DomainInfo, EdgeDnsFactory, EdgeDnsProvider, Registrar, RegistrarFactory, TsigKey, ZoneCreate,
    ZonePlacement, ZoneType,
};
