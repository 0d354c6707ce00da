// # Edge DNS Trait
//
// Defines the interface to the secondary DNS hosting provider whose zone set
// is kept in step with the registrar.
//
// ## Implementations
//
// - Akamai Config DNS v2: `zonesync-edgedns` crate

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::registrar::TsigKey;

/// Activation state of zones that are never considered part of the edge set
pub const LOCKED_STATE: &str = "LOCKED";

/// Comment attached to every zone this tool creates
pub const DEFAULT_ZONE_COMMENT: &str = "Created by EdgeDNS Registrar Coordinator";

/// Zone type on Edge DNS
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneType {
    Primary,
    Secondary,
    Alias,
}

/// Where a new zone is placed on the hosting provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZonePlacement {
    /// Contract the zone is billed against
    pub contract_id: String,
    /// Group the zone is created in
    pub group_id: u64,
}

impl ZonePlacement {
    pub fn new(contract_id: impl Into<String>, group_id: u64) -> Self {
        Self {
            contract_id: contract_id.into(),
            group_id,
        }
    }
}

/// Zone creation record
///
/// Built transiently for every new zone. Serializes to the Config DNS v2
/// zone creation body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneCreate {
    pub zone: String,
    #[serde(rename = "type")]
    pub zone_type: ZoneType,
    pub comment: String,
    #[serde(default)]
    pub masters: Vec<String>,
    #[serde(default)]
    pub sign_and_serve: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sign_and_serve_algorithm: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tsig_key: Option<TsigKey>,
}

impl ZoneCreate {
    /// Create an unsigned secondary zone record transferring from `masters`
    pub fn secondary(zone: impl Into<String>, masters: Vec<String>) -> Self {
        Self {
            zone: zone.into(),
            zone_type: ZoneType::Secondary,
            comment: DEFAULT_ZONE_COMMENT.to_string(),
            masters,
            sign_and_serve: false,
            sign_and_serve_algorithm: None,
            tsig_key: None,
        }
    }

    /// Override the zone comment
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    /// Enable sign-and-serve with the given algorithm
    pub fn with_sign_and_serve(mut self, algorithm: impl Into<String>) -> Self {
        self.sign_and_serve = true;
        self.sign_and_serve_algorithm = Some(algorithm.into());
        self
    }

    /// Attach a TSIG key for zone transfers
    pub fn with_tsig_key(mut self, key: TsigKey) -> Self {
        self.tsig_key = Some(key);
        self
    }
}

/// Trait for Edge DNS implementations
///
/// # Trust Level: Untrusted
///
/// Providers execute exactly the call they are asked to make. Retry policy,
/// dry-run handling and the decision of what to create or delete belong to
/// the engine.
#[async_trait]
pub trait EdgeDnsProvider: Send + Sync {
    /// List the names of secondary zones currently hosted
    ///
    /// Zones whose activation state equals any entry of `filter_out_states`
    /// are left out of the result.
    async fn get_zone_names(&self, filter_out_states: &[String])
    -> Result<Vec<String>, crate::Error>;

    /// Create a single zone
    async fn create_zone(
        &self,
        zone: &ZoneCreate,
        placement: &ZonePlacement,
    ) -> Result<(), crate::Error>;

    /// Submit one bulk deletion for all of `zones`
    async fn delete_bulk_zones(&self, zones: &[String]) -> Result<(), crate::Error>;

    /// Provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

/// Helper trait for constructing Edge DNS providers from configuration
pub trait EdgeDnsFactory: Send + Sync {
    /// Create an EdgeDnsProvider instance from configuration
    fn create(
        &self,
        config: &crate::config::EdgeDnsConfig,
    ) -> Result<Box<dyn EdgeDnsProvider>, crate::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsigned_secondary_omits_optional_fields() {
        let zone = ZoneCreate::secondary("example.com", vec!["192.0.2.1".to_string()]);
        let body = serde_json::to_value(&zone).unwrap();

        assert_eq!(body["zone"], "example.com");
        assert_eq!(body["type"], "secondary");
        assert_eq!(body["comment"], DEFAULT_ZONE_COMMENT);
        assert_eq!(body["masters"][0], "192.0.2.1");
        assert_eq!(body["signAndServe"], false);
        assert!(body.get("signAndServeAlgorithm").is_none());
        assert!(body.get("tsigKey").is_none());
    }

    #[test]
    fn signed_secondary_with_tsig() {
        let zone = ZoneCreate::secondary("example.com", vec![])
            .with_sign_and_serve("ECDSA_P256_SHA256")
            .with_tsig_key(TsigKey::new("xfr", "hmac-sha256", "c2VjcmV0"));
        let body = serde_json::to_value(&zone).unwrap();

        assert_eq!(body["signAndServe"], true);
        assert_eq!(body["signAndServeAlgorithm"], "ECDSA_P256_SHA256");
        assert_eq!(body["tsigKey"]["name"], "xfr");
        assert_eq!(body["tsigKey"]["secret"], "c2VjcmV0");
    }
}
