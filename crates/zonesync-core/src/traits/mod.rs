//! Core traits for the zone synchronization system
//!
//! This module defines the abstract interfaces that all backends must follow.
//!
//! - [`Registrar`]: System of record for primary domains
//! - [`EdgeDnsProvider`]: Secondary DNS hosting provider

pub mod edge_dns;
pub mod registrar;

pub use edge_dns::{
    DEFAULT_ZONE_COMMENT, EdgeDnsFactory, EdgeDnsProvider, LOCKED_STATE, ZoneCreate,
    ZonePlacement, ZoneType,
};
pub use registrar::{DomainInfo, Registrar, RegistrarFactory, TsigKey};
