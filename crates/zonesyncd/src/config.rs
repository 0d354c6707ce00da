//! Environment configuration
//!
//! Every setting is read from a `ZONESYNC_` prefixed variable. Reading goes
//! through a lookup function so tests can supply their own environment.

use anyhow::{Context, Result, bail};
use zonesync_core::config::{
    CoordinatorConfig, EdgeDnsConfig, EdgeGridSettings, MAX_INTERVAL_SECS, RegistrarConfig,
};
use zonesync_core::traits::ZonePlacement;
use zonesync_core::SyncConfig;

const PREFIX: &str = "ZONESYNC_";

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub registrar: String,
    pub instance: Option<String>,
    pub interval_secs: u64,
    pub dry_run: bool,
    pub once: bool,
    pub fail_on_error: bool,
    pub dnssec: bool,
    pub tsig: bool,
    pub edgedns_contract: String,
    pub edgedns_group: u64,
    pub edgegrid: EdgeGridSettings,
    /// Akamai registrar account, when it differs from the Edge DNS one
    pub registrar_edgegrid: Option<EdgeGridSettings>,
    pub akamai_contracts: Vec<String>,
    pub akamai_name_filter: Option<String>,
    pub file_domains_path: Option<String>,
    pub file_master_ips: Vec<String>,
    pub file_refresh_secs: u64,
    pub log_level: String,
    pub log_format: LogFormat,
    pub log_file: Option<String>,
}

impl Config {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup`, which receives full variable names
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| {
            lookup(&format!("{PREFIX}{key}"))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let flag = |key: &str| -> Result<bool> {
            match get(key) {
                Some(value) => parse_bool(&value)
                    .with_context(|| format!("{PREFIX}{key} must be a boolean. Got: {value}")),
                None => Ok(false),
            }
        };
        let number = |key: &str, default: u64| -> Result<u64> {
            match get(key) {
                Some(value) => value
                    .parse()
                    .with_context(|| format!("{PREFIX}{key} must be a number. Got: {value}")),
                None => Ok(default),
            }
        };

        let edgegrid = |prefix: &str| EdgeGridSettings {
            host: get(&format!("{prefix}EDGEGRID_HOST")).unwrap_or_default(),
            client_token: get(&format!("{prefix}EDGEGRID_CLIENT_TOKEN")).unwrap_or_default(),
            client_secret: get(&format!("{prefix}EDGEGRID_CLIENT_SECRET")).unwrap_or_default(),
            access_token: get(&format!("{prefix}EDGEGRID_ACCESS_TOKEN")).unwrap_or_default(),
            edgerc_path: get(&format!("{prefix}EDGEGRID_EDGERC_PATH")),
            edgerc_section: get(&format!("{prefix}EDGEGRID_EDGERC_SECTION")),
            ..Default::default()
        };
        let registrar_edgegrid = Some(edgegrid("REGISTRAR_")).filter(|settings| {
            !settings.host.is_empty()
                || !settings.client_token.is_empty()
                || !settings.client_secret.is_empty()
                || !settings.access_token.is_empty()
                || settings.edgerc_path.is_some()
                || settings.edgerc_section.is_some()
        });

        let log_format = match get("LOG_FORMAT").as_deref() {
            None | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => bail!("{PREFIX}LOG_FORMAT must be text or json. Got: {other}"),
        };

        Ok(Self {
            registrar: get("REGISTRAR").unwrap_or_default(),
            instance: get("INSTANCE"),
            interval_secs: number("INTERVAL_SECS", 15 * 60)?,
            dry_run: flag("DRY_RUN")?,
            once: flag("ONCE")?,
            fail_on_error: flag("FAIL_ON_ERROR")?,
            dnssec: flag("DNSSEC")?,
            tsig: flag("TSIG")?,
            edgedns_contract: get("EDGEDNS_CONTRACT").unwrap_or_default(),
            edgedns_group: number("EDGEDNS_GROUP", 0)?,
            edgegrid: edgegrid(""),
            registrar_edgegrid,
            akamai_contracts: split_list(get("AKAMAI_CONTRACTS")),
            akamai_name_filter: get("AKAMAI_NAME_FILTER"),
            file_domains_path: get("FILE_DOMAINS_PATH"),
            file_master_ips: split_list(get("FILE_MASTER_IPS")),
            file_refresh_secs: number("FILE_REFRESH_SECS", 600)?,
            log_level: get("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            log_format,
            log_file: get("LOG_FILE"),
        })
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.interval_secs == 0 {
            bail!("{PREFIX}INTERVAL_SECS must be greater than zero");
        }

        if self.interval_secs > MAX_INTERVAL_SECS {
            bail!("{PREFIX}INTERVAL_SECS must be at most {MAX_INTERVAL_SECS} (one week)");
        }

        if self.registrar.is_empty() {
            bail!(
                "{PREFIX}REGISTRAR is required. \
                Set it via: export {PREFIX}REGISTRAR=akamai"
            );
        }

        if self.edgedns_contract.is_empty() {
            bail!("{PREFIX}EDGEDNS_CONTRACT is required");
        }

        if self.edgedns_group < 1 {
            bail!("{PREFIX}EDGEDNS_GROUP is required and must be at least 1");
        }

        if !self.edgegrid.has_inline_credentials() && self.edgegrid.edgerc_path.is_none() {
            bail!(
                "Edge DNS credentials are required. Set {PREFIX}EDGEGRID_HOST, \
                {PREFIX}EDGEGRID_CLIENT_TOKEN, {PREFIX}EDGEGRID_CLIENT_SECRET and \
                {PREFIX}EDGEGRID_ACCESS_TOKEN, or {PREFIX}EDGEGRID_EDGERC_PATH"
            );
        }

        match self.registrar.as_str() {
            "akamai" => {
                if self.akamai_contracts.is_empty() {
                    bail!("{PREFIX}AKAMAI_CONTRACTS is required when {PREFIX}REGISTRAR=akamai");
                }
                if let Some(settings) = &self.registrar_edgegrid {
                    if !settings.has_inline_credentials() && settings.edgerc_path.is_none() {
                        bail!(
                            "Registrar credentials are incomplete. Set all of \
                            {PREFIX}REGISTRAR_EDGEGRID_HOST, {PREFIX}REGISTRAR_EDGEGRID_CLIENT_TOKEN, \
                            {PREFIX}REGISTRAR_EDGEGRID_CLIENT_SECRET and \
                            {PREFIX}REGISTRAR_EDGEGRID_ACCESS_TOKEN, or \
                            {PREFIX}REGISTRAR_EDGEGRID_EDGERC_PATH"
                        );
                    }
                }
            }
            "file" => {
                if self.file_domains_path.is_none() {
                    bail!(
                        "{PREFIX}FILE_DOMAINS_PATH is required when {PREFIX}REGISTRAR=file"
                    );
                }
                if self.file_master_ips.is_empty() {
                    bail!(
                        "{PREFIX}FILE_MASTER_IPS must contain at least one address when \
                        {PREFIX}REGISTRAR=file"
                    );
                }
            }
            other => bail!(
                "{PREFIX}REGISTRAR '{}' is not supported. Supported registrars: akamai, file",
                other
            ),
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => bail!(
                "{PREFIX}LOG_LEVEL must be one of trace, debug, info, warn, error. Got: {}",
                other
            ),
        }

        self.to_coordinator()
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))
    }

    /// Library configuration for the engine and backends
    pub fn to_coordinator(&self) -> CoordinatorConfig {
        let registrar = match self.registrar.as_str() {
            "file" => RegistrarConfig::File {
                domains_path: self.file_domains_path.clone().unwrap_or_default(),
                master_ips: self.file_master_ips.clone(),
                refresh_secs: self.file_refresh_secs,
            },
            _ => RegistrarConfig::Akamai {
                contracts: self.akamai_contracts.clone(),
                name_filter: self.akamai_name_filter.clone(),
                edgegrid: self
                    .registrar_edgegrid
                    .clone()
                    .unwrap_or_else(|| self.edgegrid.clone()),
            },
        };

        let placement = ZonePlacement::new(&self.edgedns_contract, self.edgedns_group);
        let instance = self
            .instance
            .clone()
            .unwrap_or_else(|| registrar.type_name().to_string());
        let mut sync = SyncConfig::new(instance, placement);
        sync.interval_secs = self.interval_secs;
        sync.dry_run = self.dry_run;
        sync.once = self.once;
        sync.fail_on_error = self.fail_on_error;
        sync.dnssec = self.dnssec;
        sync.tsig = self.tsig;

        CoordinatorConfig {
            sync,
            registrar,
            edge_dns: EdgeDnsConfig::EdgeDns {
                contracts: vec![self.edgedns_contract.clone()],
                edgegrid: self.edgegrid.clone(),
            },
        }
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => bail!("not a boolean"),
    }
}

fn split_list(value: Option<String>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
