//! Compiled-in backend registry
//!
//! Registrars and Edge DNS providers are selected by type name from
//! configuration, avoiding hardcoded if-else chains in the daemon. Backends
//! are linked at build time; nothing is loaded at runtime.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use zonesync_core::registry::BackendRegistry;
//!
//! let registry = BackendRegistry::new();
//! zonesync_edgedns::register(&registry);
//! zonesync_registrar_file::register(&registry);
//!
//! let registrar = registry.create_registrar(&config.registrar)?;
//! let edge_dns = registry.create_edge_dns(&config.edge_dns)?;
//! ```
//!
//! ## Registration
//!
//! Backend crates register themselves through a `register` function:
//!
//! ```rust,ignore
//! pub fn register(registry: &BackendRegistry) {
//!     registry.register_registrar("file", Box::new(FileRegistrarFactory));
//! }
//! ```

use crate::config::{EdgeDnsConfig, RegistrarConfig};
use crate::error::{Error, Result};
use crate::traits::{EdgeDnsFactory, EdgeDnsProvider, Registrar, RegistrarFactory};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Registry of backend factories keyed by type name
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes.
#[derive(Default)]
pub struct BackendRegistry {
    /// Registered registrar factories
    registrars: RwLock<HashMap<String, Box<dyn RegistrarFactory>>>,

    /// Registered Edge DNS provider factories
    edge_dns: RwLock<HashMap<String, Box<dyn EdgeDnsFactory>>>,
}

impl BackendRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a registrar factory under `name` (e.g. "akamai", "file")
    ///
    /// A later registration with the same name replaces the earlier one.
    pub fn register_registrar(&self, name: impl Into<String>, factory: Box<dyn RegistrarFactory>) {
        self.registrars
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), factory);
    }

    /// Register an Edge DNS factory under `name` (e.g. "edgedns")
    pub fn register_edge_dns(&self, name: impl Into<String>, factory: Box<dyn EdgeDnsFactory>) {
        self.edge_dns
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), factory);
    }

    /// Create a registrar from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn Registrar>)`: Created registrar instance
    /// - `Err(Error)`: If the type is not registered or creation fails
    pub fn create_registrar(&self, config: &RegistrarConfig) -> Result<Box<dyn Registrar>> {
        let registrar_type = config.type_name();
        let registrars = self.registrars.read().unwrap_or_else(PoisonError::into_inner);

        let factory = registrars.get(registrar_type).ok_or_else(|| {
            Error::config(format!("Unknown registrar type: {}", registrar_type))
        })?;

        factory.create(config)
    }

    /// Create an Edge DNS provider from configuration
    pub fn create_edge_dns(&self, config: &EdgeDnsConfig) -> Result<Box<dyn EdgeDnsProvider>> {
        let provider_type = config.type_name();
        let providers = self.edge_dns.read().unwrap_or_else(PoisonError::into_inner);

        let factory = providers.get(provider_type).ok_or_else(|| {
            Error::config(format!("Unknown Edge DNS provider type: {}", provider_type))
        })?;

        factory.create(config)
    }

    /// List all registered registrar types, sorted
    pub fn list_registrars(&self) -> Vec<String> {
        let registrars = self.registrars.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = registrars.keys().cloned().collect();
        names.sort();
        names
    }

    /// List all registered Edge DNS provider types, sorted
    pub fn list_edge_dns(&self) -> Vec<String> {
        let providers = self.edge_dns.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = providers.keys().cloned().collect();
        names.sort();
        names
    }

    /// Check if a registrar type is registered
    pub fn has_registrar(&self, name: &str) -> bool {
        self.registrars
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// Check if an Edge DNS provider type is registered
    pub fn has_edge_dns(&self, name: &str) -> bool {
        self.edge_dns
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }
}
