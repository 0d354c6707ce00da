//! Edge DNS zone provider
//!
//! Hosts the secondary zones. Reads the zone set through the zone listing
//! (secondary zones of the configured contracts) and applies the mutations
//! the engine decides on.

use async_trait::async_trait;
use zonesync_core::config::EdgeDnsConfig;
use zonesync_core::traits::{EdgeDnsFactory, EdgeDnsProvider, ZoneCreate, ZonePlacement};
use zonesync_core::{Error, Result};

use crate::client::{ConfigDnsClient, ZoneListQuery};
use crate::edgegrid::EdgeGridCredentials;

/// Secondary zones on Akamai Edge DNS
pub struct EdgeDnsZoneProvider {
    client: ConfigDnsClient,
    contracts: Vec<String>,
}

impl EdgeDnsZoneProvider {
    pub fn new(client: ConfigDnsClient, contracts: Vec<String>) -> Self {
        Self { client, contracts }
    }

    fn list_query(&self) -> ZoneListQuery {
        ZoneListQuery {
            contract_ids: self.contracts.clone(),
            types: Some("SECONDARY".to_string()),
            search: None,
            show_all: true,
            sort_by: Some("zone".to_string()),
        }
    }
}

#[async_trait]
impl EdgeDnsProvider for EdgeDnsZoneProvider {
    async fn get_zone_names(&self, filter_out_states: &[String]) -> Result<Vec<String>> {
        let response = self.client.list_zones(&self.list_query()).await?;

        let zones: Vec<String> = response
            .zones
            .into_iter()
            .filter(|z| !filter_out_states.contains(&z.activation_state))
            .map(|z| z.zone)
            .collect();

        tracing::debug!("Edge DNS lists {} secondary zones", zones.len());
        Ok(zones)
    }

    async fn create_zone(&self, zone: &ZoneCreate, placement: &ZonePlacement) -> Result<()> {
        tracing::debug!(
            "Creating zone {} in contract {} group {}",
            zone.zone,
            placement.contract_id,
            placement.group_id
        );
        self.client.create_zone(zone, placement).await
    }

    async fn delete_bulk_zones(&self, zones: &[String]) -> Result<()> {
        let response = self.client.delete_bulk_zones(zones).await?;
        tracing::info!(
            "Bulk delete of {} zones submitted (request {}, expires {})",
            zones.len(),
            response.request_id,
            response.expiration_date
        );
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "edgedns"
    }
}

/// Factory for creating Edge DNS providers
pub struct EdgeDnsProviderFactory;

impl EdgeDnsFactory for EdgeDnsProviderFactory {
    fn create(&self, config: &EdgeDnsConfig) -> Result<Box<dyn EdgeDnsProvider>> {
        match config {
            EdgeDnsConfig::EdgeDns {
                contracts,
                edgegrid,
            } => {
                let credentials =
                    EdgeGridCredentials::from_settings(edgegrid, |name| std::env::var(name).ok())?;
                let client = ConfigDnsClient::new(credentials)?;
                Ok(Box::new(EdgeDnsZoneProvider::new(client, split_contracts(contracts))))
            }
            _ => Err(Error::config("Invalid config type for Edge DNS provider")),
        }
    }
}

/// Flatten contract entries, accepting comma separated lists
pub(crate) fn split_contracts(contracts: &[String]) -> Vec<String> {
    contracts
        .iter()
        .flat_map(|c| c.split(','))
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}
