//! Zone set differ
//!
//! Decides which zones must be created on, or removed from, Edge DNS.
//!
//! - `new_zones`: registrar domains Edge DNS does not host yet
//! - `removed_zones`: domains the registrar claimed in the previous cycle,
//!   no longer claims, and Edge DNS still hosts
//!
//! A zone is only ever removed after it has been seen as registrar owned in
//! the previous cycle. With an empty prior tally (cold start) nothing is
//! removed, even when Edge DNS hosts zones the registrar does not list.
//!
//! Zone names are compared exactly as reported by the backends. No case
//! folding or trailing dot handling is applied.

use std::collections::HashSet;

/// Output of a single diff
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZoneDiff {
    /// Zones to create
    pub new_zones: Vec<String>,
    /// Zones to delete
    pub removed_zones: Vec<String>,
}

impl ZoneDiff {
    /// Nothing to create or remove
    pub fn is_empty(&self) -> bool {
        self.new_zones.is_empty() && self.removed_zones.is_empty()
    }
}

/// Compute the zones to create and remove
///
/// `new_zones` keeps the registrar's order with duplicates collapsed.
/// `removed_zones` has no defined order.
pub fn diff_zones(
    edge_zones: &[String],
    registrar_domains: &[String],
    prior_tally: &HashSet<String>,
) -> ZoneDiff {
    let edge: HashSet<&str> = edge_zones.iter().map(String::as_str).collect();
    let registrar: HashSet<&str> = registrar_domains.iter().map(String::as_str).collect();

    let mut seen = HashSet::new();
    let new_zones = registrar_domains
        .iter()
        .filter(|domain| !edge.contains(domain.as_str()))
        .filter(|domain| seen.insert(domain.as_str()))
        .cloned()
        .collect();

    let removed_zones = prior_tally
        .iter()
        .filter(|domain| !registrar.contains(domain.as_str()) && edge.contains(domain.as_str()))
        .cloned()
        .collect();

    ZoneDiff {
        new_zones,
        removed_zones,
    }
}
