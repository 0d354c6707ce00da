//! Configuration types for the zone synchronization system
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::traits::{DEFAULT_ZONE_COMMENT, LOCKED_STATE, ZonePlacement};

/// Longest accepted cycle interval (one week)
pub const MAX_INTERVAL_SECS: u64 = 7 * 24 * 60 * 60;

/// Main configuration: one reconciliation instance and its two backends
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Loop and mutation policy
    pub sync: SyncConfig,

    /// Registrar backend configuration
    pub registrar: RegistrarConfig,

    /// Edge DNS backend configuration
    pub edge_dns: EdgeDnsConfig,
}

impl CoordinatorConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.sync.validate()?;
        self.registrar.validate()?;
        self.edge_dns.validate()?;
        Ok(())
    }
}

/// Reconciliation loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Key under which the previous registrar tally is remembered
    #[serde(default)]
    pub instance: String,

    /// Time between the start of two cycles (in seconds)
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Compute and log mutations without applying them
    #[serde(default)]
    pub dry_run: bool,

    /// Stop after the first full cycle
    #[serde(default)]
    pub once: bool,

    /// Terminate the loop on the first operational error
    #[serde(default)]
    pub fail_on_error: bool,

    /// Request sign-and-serve for new zones when the registrar knows an algorithm
    #[serde(default)]
    pub dnssec: bool,

    /// Attach the registrar's TSIG key to new zones
    #[serde(default)]
    pub tsig: bool,

    /// Contract and group for new zones
    pub placement: ZonePlacement,

    /// Activation states excluded from the edge zone set
    #[serde(default = "default_filter_out_states")]
    pub filter_out_states: Vec<String>,

    /// Comment attached to created zones
    #[serde(default = "default_zone_comment")]
    pub zone_comment: String,

    /// Capacity of the engine event channel
    ///
    /// When full, new events are dropped (with a warning log).
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl SyncConfig {
    /// Create a configuration with defaults for the given placement
    pub fn new(instance: impl Into<String>, placement: ZonePlacement) -> Self {
        Self {
            instance: instance.into(),
            interval_secs: default_interval_secs(),
            dry_run: false,
            once: false,
            fail_on_error: false,
            dnssec: false,
            tsig: false,
            placement,
            filter_out_states: default_filter_out_states(),
            zone_comment: default_zone_comment(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }

    /// Interval as a [`Duration`]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.interval_secs == 0 {
            return Err(crate::Error::config("Interval must be greater than zero"));
        }
        if self.interval_secs > MAX_INTERVAL_SECS {
            return Err(crate::Error::config(format!(
                "Interval must be at most {MAX_INTERVAL_SECS} seconds"
            )));
        }
        if self.placement.contract_id.is_empty() {
            return Err(crate::Error::config("Edge DNS contract is required"));
        }
        if self.placement.group_id < 1 {
            return Err(crate::Error::config("Edge DNS group is required"));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }
        Ok(())
    }
}

/// EdgeGrid API credentials
///
/// Inline credentials are used only when all four values are present;
/// otherwise the `.edgerc` file is consulted.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct EdgeGridSettings {
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub client_token: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default)]
    pub access_token: String,
    /// Account switch key
    #[serde(default)]
    pub account_key: Option<String>,
    /// Maximum number of body bytes covered by the request signature
    #[serde(default)]
    pub max_body: Option<usize>,
    /// `.edgerc` path (default `~/.edgerc`)
    #[serde(default)]
    pub edgerc_path: Option<String>,
    /// `.edgerc` section (default `default`)
    #[serde(default)]
    pub edgerc_section: Option<String>,
}

impl EdgeGridSettings {
    /// All four inline credential values are set
    pub fn has_inline_credentials(&self) -> bool {
        !self.host.is_empty()
            && !self.client_token.is_empty()
            && !self.client_secret.is_empty()
            && !self.access_token.is_empty()
    }

    fn validate(&self, owner: &str) -> Result<(), crate::Error> {
        if self.has_inline_credentials() || self.edgerc_path.is_some() {
            return Ok(());
        }
        let missing = [
            ("host", self.host.is_empty()),
            ("client token", self.client_token.is_empty()),
            ("client secret", self.client_secret.is_empty()),
            ("access token", self.access_token.is_empty()),
        ]
        .iter()
        .filter(|(_, missing)| *missing)
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(", ");
        Err(crate::Error::config(format!(
            "{owner}: no EdgeGrid {missing} specified and no .edgerc path given"
        )))
    }
}

// Custom Debug implementation that hides the secrets
impl std::fmt::Debug for EdgeGridSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EdgeGridSettings")
            .field("host", &self.host)
            .field("client_token", &"<REDACTED>")
            .field("client_secret", &"<REDACTED>")
            .field("access_token", &"<REDACTED>")
            .field("account_key", &self.account_key)
            .field("max_body", &self.max_body)
            .field("edgerc_path", &self.edgerc_path)
            .field("edgerc_section", &self.edgerc_section)
            .finish()
    }
}

/// Registrar backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RegistrarConfig {
    /// Primary zones hosted on Akamai Edge DNS
    Akamai {
        /// Contracts whose primary zones count as registrar domains
        contracts: Vec<String>,
        /// Optional zone name search filter
        #[serde(default)]
        name_filter: Option<String>,
        /// API credentials
        #[serde(default)]
        edgegrid: EdgeGridSettings,
    },

    /// Local domain list file with static master addresses
    File {
        /// Path to the domain list (one domain per line)
        domains_path: String,
        /// Master name server addresses
        master_ips: Vec<String>,
        /// Re-read the file once the cached copy is older than this
        #[serde(default = "default_file_refresh_secs")]
        refresh_secs: u64,
    },

    /// Custom registrar
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl RegistrarConfig {
    /// Validate the registrar configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            RegistrarConfig::Akamai {
                contracts,
                edgegrid,
                ..
            } => {
                if contracts.iter().all(|c| c.trim().is_empty()) {
                    return Err(crate::Error::config(
                        "Akamai registrar requires at least one contract",
                    ));
                }
                edgegrid.validate("Akamai registrar")
            }
            RegistrarConfig::File {
                domains_path,
                master_ips,
                refresh_secs,
            } => {
                if domains_path.is_empty() {
                    return Err(crate::Error::config(
                        "File registrar domain list path cannot be empty",
                    ));
                }
                if master_ips.is_empty() {
                    return Err(crate::Error::config(
                        "File registrar requires one or more master IPs",
                    ));
                }
                for ip in master_ips {
                    if ip.parse::<std::net::IpAddr>().is_err() {
                        return Err(crate::Error::config(format!(
                            "File registrar master IP is not an IP address: {ip}"
                        )));
                    }
                }
                if *refresh_secs == 0 {
                    return Err(crate::Error::config(
                        "File registrar refresh interval must be > 0",
                    ));
                }
                Ok(())
            }
            RegistrarConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config("Custom registrar factory cannot be empty"));
                }
                if config.is_null() {
                    return Err(crate::Error::config("Custom registrar config cannot be null"));
                }
                Ok(())
            }
        }
    }

    /// Get the registrar type name
    pub fn type_name(&self) -> &str {
        match self {
            RegistrarConfig::Akamai { .. } => "akamai",
            RegistrarConfig::File { .. } => "file",
            RegistrarConfig::Custom { factory, .. } => factory,
        }
    }
}

/// Edge DNS backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EdgeDnsConfig {
    /// Akamai Edge DNS (Config DNS v2 API)
    #[serde(rename = "edgedns")]
    EdgeDns {
        /// Contracts listed when reading the edge zone set
        contracts: Vec<String>,
        /// API credentials
        #[serde(default)]
        edgegrid: EdgeGridSettings,
    },

    /// Custom provider
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl EdgeDnsConfig {
    /// Validate the Edge DNS configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            EdgeDnsConfig::EdgeDns {
                contracts,
                edgegrid,
            } => {
                if contracts.iter().all(|c| c.trim().is_empty()) {
                    return Err(crate::Error::config("Edge DNS contract is required"));
                }
                edgegrid.validate("Edge DNS")
            }
            EdgeDnsConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config("Custom Edge DNS factory cannot be empty"));
                }
                if config.is_null() {
                    return Err(crate::Error::config("Custom Edge DNS config cannot be null"));
                }
                Ok(())
            }
        }
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &str {
        match self {
            EdgeDnsConfig::EdgeDns { .. } => "edgedns",
            EdgeDnsConfig::Custom { factory, .. } => factory,
        }
    }
}

fn default_interval_secs() -> u64 {
    15 * 60
}

fn default_filter_out_states() -> Vec<String> {
    vec![LOCKED_STATE.to_string()]
}

fn default_zone_comment() -> String {
    DEFAULT_ZONE_COMMENT.to_string()
}

fn default_event_channel_capacity() -> usize {
    1000
}

fn default_file_refresh_secs() -> u64 {
    600
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placement() -> ZonePlacement {
        ZonePlacement::new("C-123456", 123456789)
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = SyncConfig::new("akamai", placement());

        assert_eq!(config.interval(), Duration::from_secs(900));
        assert_eq!(config.filter_out_states, vec!["LOCKED".to_string()]);
        assert_eq!(config.zone_comment, DEFAULT_ZONE_COMMENT);
        assert!(!config.dry_run && !config.once && !config.fail_on_error);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn serde_defaults_fill_missing_fields() {
        let config: SyncConfig = serde_json::from_value(serde_json::json!({
            "placement": { "contract_id": "C-1", "group_id": 7 }
        }))
        .unwrap();

        assert_eq!(config.interval_secs, 900);
        assert_eq!(config.event_channel_capacity, 1000);
    }

    #[test]
    fn zero_interval_is_rejected() {
        let mut config = SyncConfig::new("akamai", placement());
        config.interval_secs = 0;
        assert!(matches!(config.validate(), Err(crate::Error::Config(_))));
    }

    #[test]
    fn oversized_interval_is_rejected() {
        let mut config = SyncConfig::new("akamai", placement());
        config.interval_secs = MAX_INTERVAL_SECS;
        assert!(config.validate().is_ok());

        config.interval_secs = u64::MAX;
        assert!(matches!(config.validate(), Err(crate::Error::Config(_))));
    }

    #[test]
    fn placement_requires_contract_and_group() {
        let mut config = SyncConfig::new("akamai", ZonePlacement::new("", 1));
        assert!(config.validate().is_err());

        config.placement = ZonePlacement::new("C-1", 0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn edgegrid_accepts_inline_or_edgerc() {
        let inline = EdgeGridSettings {
            host: "akab-host.luna.akamaiapis.net".to_string(),
            client_token: "ct".to_string(),
            client_secret: "cs".to_string(),
            access_token: "at".to_string(),
            ..Default::default()
        };
        assert!(inline.validate("test").is_ok());

        let edgerc = EdgeGridSettings {
            edgerc_path: Some("/home/user/.edgerc".to_string()),
            ..Default::default()
        };
        assert!(edgerc.validate("test").is_ok());

        let partial = EdgeGridSettings {
            host: "akab-host.luna.akamaiapis.net".to_string(),
            ..Default::default()
        };
        let err = partial.validate("test").unwrap_err().to_string();
        assert!(err.contains("client token"));
        assert!(!err.contains("host,"));
    }

    #[test]
    fn edgegrid_debug_hides_secrets() {
        let settings = EdgeGridSettings {
            client_secret: "very-secret".to_string(),
            ..Default::default()
        };
        assert!(!format!("{:?}", settings).contains("very-secret"));
    }

    #[test]
    fn file_registrar_validation() {
        let valid = RegistrarConfig::File {
            domains_path: "/var/lib/zonesync/domains.txt".to_string(),
            master_ips: vec!["192.0.2.1".to_string()],
            refresh_secs: 600,
        };
        assert!(valid.validate().is_ok());
        assert_eq!(valid.type_name(), "file");

        let no_masters = RegistrarConfig::File {
            domains_path: "/var/lib/zonesync/domains.txt".to_string(),
            master_ips: vec![],
            refresh_secs: 600,
        };
        assert!(no_masters.validate().is_err());

        let bad_master = RegistrarConfig::File {
            domains_path: "/var/lib/zonesync/domains.txt".to_string(),
            master_ips: vec!["ns1.example.com".to_string()],
            refresh_secs: 600,
        };
        assert!(bad_master.validate().is_err());
    }

    #[test]
    fn registrar_config_tagged_by_type() {
        let config: RegistrarConfig = serde_json::from_value(serde_json::json!({
            "type": "akamai",
            "contracts": ["C-1"],
            "edgegrid": { "edgerc_path": "/etc/zonesync/.edgerc" }
        }))
        .unwrap();

        assert_eq!(config.type_name(), "akamai");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn custom_backends_use_factory_name() {
        let config = EdgeDnsConfig::Custom {
            factory: "in-house".to_string(),
            config: serde_json::json!({ "endpoint": "https://dns.internal" }),
        };
        assert_eq!(config.type_name(), "in-house");
        assert!(config.validate().is_ok());
    }
}
