//! Akamai registrar
//!
//! Treats the primary zones hosted on Edge DNS under a set of contracts as
//! the registrar's domains. Master addresses are the resolved authoritative
//! name servers of the first contract.

use std::collections::HashSet;
use std::net::IpAddr;

use async_trait::async_trait;
use zonesync_core::config::RegistrarConfig;
use zonesync_core::traits::{
    DomainInfo, LOCKED_STATE, Registrar, RegistrarFactory, TsigKey,
};
use zonesync_core::{Error, Result};

use crate::client::{ConfigDnsClient, ZoneListQuery};
use crate::edgegrid::EdgeGridCredentials;
use crate::provider::split_contracts;

/// Registrar backed by primary zones on Akamai Edge DNS
pub struct AkamaiRegistrar {
    client: ConfigDnsClient,
    contracts: Vec<String>,
    name_filter: Option<String>,
}

impl AkamaiRegistrar {
    pub fn new(client: ConfigDnsClient, contracts: Vec<String>, name_filter: Option<String>) -> Self {
        Self {
            client,
            contracts,
            name_filter,
        }
    }
}

#[async_trait]
impl Registrar for AkamaiRegistrar {
    async fn get_domains(&self) -> Result<Vec<String>> {
        let query = ZoneListQuery {
            contract_ids: self.contracts.clone(),
            types: Some("PRIMARY".to_string()),
            search: self.name_filter.clone(),
            show_all: false,
            sort_by: Some("zone".to_string()),
        };
        let response = self.client.list_zones(&query).await?;

        let domains: Vec<String> = response
            .zones
            .into_iter()
            .filter(|z| z.activation_state != LOCKED_STATE)
            .map(|z| z.zone)
            .collect();

        tracing::debug!("Akamai registrar lists {} primary zones", domains.len());
        Ok(domains)
    }

    async fn get_master_ips(&self) -> Result<Vec<String>> {
        let contract = self
            .contracts
            .first()
            .ok_or_else(|| Error::registrar("No contracts provided"))?;

        let authorities = self.client.get_authorities(contract).await?;
        if authorities.is_empty() {
            return Err(Error::registrar(format!(
                "No authoritative name servers for contract {}",
                contract
            )));
        }

        let mut seen = HashSet::new();
        let mut masters = Vec::new();
        for authority in &authorities {
            for ip in resolve(authority).await? {
                if seen.insert(ip.clone()) {
                    masters.push(ip);
                }
            }
        }

        tracing::debug!("Akamai registrar master IPs: {:?}", masters);
        Ok(masters)
    }

    async fn get_serve_algorithm(&self, domain: &str) -> Result<String> {
        // An unreadable zone means "no algorithm known"
        match self.client.get_zone(domain).await {
            Ok(zone) => Ok(zone.sign_and_serve_algorithm.unwrap_or_default()),
            Err(e) => {
                tracing::debug!("No serve algorithm for {}: {}", domain, e);
                Ok(String::new())
            }
        }
    }

    async fn get_tsig_key(&self, domain: &str) -> Result<Option<TsigKey>> {
        let key = self.client.get_zone_key(domain).await?;
        Ok(Some(key))
    }

    async fn get_domain(&self, domain: &str) -> Result<Option<DomainInfo>> {
        let zone = self.client.get_zone(domain).await?;
        Ok(Some(DomainInfo {
            name: zone.zone,
            zone_type: zone.zone_type,
            sign_and_serve: zone.sign_and_serve,
            sign_and_serve_algorithm: zone.sign_and_serve_algorithm,
            masters: zone.masters,
            tsig_key: zone.tsig_key,
        }))
    }

    fn registrar_name(&self) -> &'static str {
        "akamai"
    }
}

/// Resolve an authority host name to its addresses
async fn resolve(authority: &str) -> Result<Vec<String>> {
    let host = authority.trim().trim_end_matches('.');
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(vec![ip.to_string()]);
    }

    let addrs = tokio::net::lookup_host((host, 53))
        .await
        .map_err(|e| Error::registrar(format!("Failed to resolve authority {}: {}", host, e)))?;
    Ok(addrs.map(|a| a.ip().to_string()).collect())
}

/// Factory for creating Akamai registrars
pub struct AkamaiRegistrarFactory;

impl RegistrarFactory for AkamaiRegistrarFactory {
    fn create(&self, config: &RegistrarConfig) -> Result<Box<dyn Registrar>> {
        match config {
            RegistrarConfig::Akamai {
                contracts,
                name_filter,
                edgegrid,
            } => {
                let credentials =
                    EdgeGridCredentials::from_settings(edgegrid, |name| std::env::var(name).ok())?;
                let client = ConfigDnsClient::new(credentials)?;
                let name_filter = name_filter.clone().filter(|f| !f.is_empty());
                Ok(Box::new(AkamaiRegistrar::new(
                    client,
                    split_contracts(contracts),
                    name_filter,
                )))
            }
            _ => Err(Error::config("Invalid config type for Akamai registrar")),
        }
    }
}
