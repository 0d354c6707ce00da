// # Akamai Edge DNS Backends
//
// This crate talks to the Akamai Config DNS v2 API and provides both sides
// of a reconciliation:
//
// - [`EdgeDnsZoneProvider`]: the secondary zones hosted on Edge DNS
// - [`AkamaiRegistrar`]: primary zones on Edge DNS used as the registrar
//
// ## Trust Level: Untrusted
//
// Both backends make exactly one API request per trait call (the Akamai
// registrar additionally resolves authority host names). They never retry,
// never cache and never spawn tasks. Retry happens on the next engine cycle.
//
// ## Security Requirements
//
// - Client secret and tokens never appear in logs
// - Inline credentials are only used when complete; otherwise `.edgerc`
// - Every request carries a fresh `EG1-HMAC-SHA256` signature
//
// ## API Reference
//
// - Config DNS v2: https://techdocs.akamai.com/edge-dns/reference
// - EdgeGrid authentication: https://techdocs.akamai.com/developer/docs/authenticate-with-edgegrid

pub mod client;
pub mod edgegrid;
pub mod edgerc;
pub mod provider;
pub mod registrar;

pub use client::ConfigDnsClient;
pub use edgegrid::EdgeGridCredentials;
pub use provider::{EdgeDnsProviderFactory, EdgeDnsZoneProvider};
pub use registrar::{AkamaiRegistrar, AkamaiRegistrarFactory};

/// Register the Edge DNS provider and the Akamai registrar
///
/// # Example
///
/// ```rust,ignore
/// use zonesync_core::BackendRegistry;
///
/// let registry = BackendRegistry::new();
/// zonesync_edgedns::register(&registry);
/// ```
pub fn register(registry: &zonesync_core::BackendRegistry) {
    registry.register_edge_dns("edgedns", Box::new(EdgeDnsProviderFactory));
    registry.register_registrar("akamai", Box::new(AkamaiRegistrarFactory));
}
