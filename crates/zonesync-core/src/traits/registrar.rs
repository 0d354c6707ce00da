// # Registrar Trait
//
// Defines the interface to the system of record for primary domain ownership.
//
// ## Implementations
//
// - Akamai (primary zones hosted on Edge DNS): `zonesync-edgedns` crate
// - Local domain list file: `zonesync-registrar-file` crate
//
// ## Usage
//
// ```rust,ignore
// use zonesync_core::Registrar;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let registrar = /* Registrar implementation */;
//
//     for domain in registrar.get_domains().await? {
//         let algorithm = registrar.get_serve_algorithm(&domain).await?;
//         println!("{domain}: {algorithm}");
//     }
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Shared secret used to authenticate zone transfers
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TsigKey {
    /// Key name
    pub name: String,
    /// HMAC algorithm (e.g. "hmac-sha256")
    pub algorithm: String,
    /// Base64 encoded secret
    pub secret: String,
}

impl TsigKey {
    pub fn new(
        name: impl Into<String>,
        algorithm: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            algorithm: algorithm.into(),
            secret: secret.into(),
        }
    }
}

// The secret must never reach the logs
impl std::fmt::Debug for TsigKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TsigKey")
            .field("name", &self.name)
            .field("algorithm", &self.algorithm)
            .field("secret", &"<REDACTED>")
            .finish()
    }
}

/// Everything a registrar knows about a single domain
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainInfo {
    pub name: String,
    pub zone_type: String,
    pub sign_and_serve: bool,
    pub sign_and_serve_algorithm: Option<String>,
    pub masters: Vec<String>,
    pub tsig_key: Option<TsigKey>,
}

/// Trait for registrar implementations
///
/// Only [`get_domains`](Registrar::get_domains) and
/// [`get_master_ips`](Registrar::get_master_ips) are mandatory. The metadata
/// lookups default to "nothing known", which the engine treats as "create the
/// zone without that feature". Partial test doubles rely on these defaults.
///
/// # Trust Level: Untrusted
///
/// Registrars only answer questions. They never mutate Edge DNS, never retry
/// (a failed fetch is retried by the engine on the next cycle) and never keep
/// state about previous cycles (the tally is owned by `ZoneSyncEngine`).
#[async_trait]
pub trait Registrar: Send + Sync {
    /// List the primary domains the registrar currently claims
    ///
    /// The registrar decides how to filter (contracts, name filters, locked
    /// zones). Names are returned exactly as they should appear on Edge DNS.
    async fn get_domains(&self) -> Result<Vec<String>, crate::Error>;

    /// Master name server addresses new secondary zones transfer from
    async fn get_master_ips(&self) -> Result<Vec<String>, crate::Error>;

    /// DNSSEC signing algorithm for a domain
    ///
    /// An empty string means "unknown"; the zone is then created unsigned.
    async fn get_serve_algorithm(&self, _domain: &str) -> Result<String, crate::Error> {
        Ok(String::new())
    }

    /// TSIG key for transfers of a domain, if one exists
    async fn get_tsig_key(&self, _domain: &str) -> Result<Option<TsigKey>, crate::Error> {
        Ok(None)
    }

    /// Full registrar view of a domain, if the backend supports it
    async fn get_domain(&self, _domain: &str) -> Result<Option<DomainInfo>, crate::Error> {
        Ok(None)
    }

    /// Registrar name (for logging/debugging)
    fn registrar_name(&self) -> &'static str;
}

/// Helper trait for constructing registrars from configuration
pub trait RegistrarFactory: Send + Sync {
    /// Create a Registrar instance from configuration
    fn create(
        &self,
        config: &crate::config::RegistrarConfig,
    ) -> Result<Box<dyn Registrar>, crate::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct DomainsOnly;

    #[async_trait]
    impl Registrar for DomainsOnly {
        async fn get_domains(&self) -> Result<Vec<String>, crate::Error> {
            Ok(vec!["example.com".to_string()])
        }

        async fn get_master_ips(&self) -> Result<Vec<String>, crate::Error> {
            Ok(vec!["192.0.2.1".to_string()])
        }

        fn registrar_name(&self) -> &'static str {
            "domains-only"
        }
    }

    #[tokio::test]
    async fn metadata_lookups_default_to_unknown() {
        let registrar = DomainsOnly;

        assert_eq!(registrar.get_serve_algorithm("example.com").await.unwrap(), "");
        assert!(registrar.get_tsig_key("example.com").await.unwrap().is_none());
        assert!(registrar.get_domain("example.com").await.unwrap().is_none());
    }

    #[test]
    fn tsig_secret_is_redacted() {
        let key = TsigKey::new("xfr.example.com", "hmac-sha256", "c2VjcmV0");
        let rendered = format!("{:?}", key);

        assert!(rendered.contains("xfr.example.com"));
        assert!(!rendered.contains("c2VjcmV0"));
    }
}
