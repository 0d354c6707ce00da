// # Tally Store
//
// In-memory store of the registrar domain set remembered from the previous
// cycle, keyed by reconciliation instance.
//
// ## Ownership
//
// A store is owned by exactly one `ZoneSyncEngine` and only touched from its
// sequential loop, so no locking is needed. Independent instances in one
// process each own their own store.
//
// ## Crash Behavior
//
// - All state is lost on restart
// - The first cycle after a restart is a cold start: zones are created but
//   nothing is removed until a baseline has been observed

use std::collections::{HashMap, HashSet};

use crate::diff::{ZoneDiff, diff_zones};

/// Registrar tallies keyed by instance identifier
#[derive(Debug, Clone, Default)]
pub struct TallyStore {
    tallies: HashMap<String, HashSet<String>>,
}

impl TallyStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Tally remembered for an instance, if any cycle has run
    pub fn get(&self, instance: &str) -> Option<&HashSet<String>> {
        self.tallies.get(instance)
    }

    /// Replace the tally of an instance
    pub fn replace(&mut self, instance: &str, domains: &[String]) {
        self.tallies
            .insert(instance.to_string(), domains.iter().cloned().collect());
    }

    /// Forget an instance
    pub fn clear(&mut self, instance: &str) {
        self.tallies.remove(instance);
    }

    /// Number of instances with a tally
    pub fn len(&self) -> usize {
        self.tallies.len()
    }

    /// No instance has a tally yet
    pub fn is_empty(&self) -> bool {
        self.tallies.is_empty()
    }

    /// Diff against the remembered tally, then remember `registrar_domains`
    ///
    /// The tally is overwritten unconditionally, whatever happens to the
    /// resulting mutations.
    pub fn diff_and_remember(
        &mut self,
        instance: &str,
        edge_zones: &[String],
        registrar_domains: &[String],
    ) -> ZoneDiff {
        let diff = match self.tallies.get(instance) {
            Some(prior) => diff_zones(edge_zones, registrar_domains, prior),
            None => diff_zones(edge_zones, registrar_domains, &HashSet::new()),
        };
        self.replace(instance, registrar_domains);
        diff
    }
}
