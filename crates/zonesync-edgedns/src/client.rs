// # Config DNS v2 Client
//
// Thin, signed HTTP client for the Akamai Edge DNS zone management API.
//
// ## Endpoints
//
// - List zones: GET `/config-dns/v2/zones?contractIds=..&types=..&search=..&showAll=..&sortBy=..`
// - Create zone: POST `/config-dns/v2/zones?contractId=..&gid=..`
// - Bulk delete: POST `/config-dns/v2/zones/delete-requests`
// - Get zone: GET `/config-dns/v2/zones/{zone}`
// - Get zone TSIG key: GET `/config-dns/v2/zones/{zone}/key`
// - Authorities: GET `/config-dns/v2/data/authorities?contractIds=..`
//
// ## Error Mapping
//
// - 401/403: authentication
// - 404: not found
// - 429: rate limited
// - 5xx: transient provider error
// - anything else: provider error
//
// The client makes exactly one request per call. It never retries; a failed
// call surfaces to the engine, which tries again next cycle. Every request is
// bounded by a 30 second timeout.

use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;
use zonesync_core::traits::{TsigKey, ZoneCreate, ZonePlacement};
use zonesync_core::{Error, Result};

use crate::edgegrid::EdgeGridCredentials;

/// Provider name used in errors
const PROVIDER: &str = "edgedns";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Query for the zone listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZoneListQuery {
    pub contract_ids: Vec<String>,
    /// Comma separated zone types (e.g. "SECONDARY")
    pub types: Option<String>,
    /// Zone name search filter
    pub search: Option<String>,
    pub show_all: bool,
    pub sort_by: Option<String>,
}

/// Zone listing response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ZoneListResponse {
    #[serde(default)]
    pub zones: Vec<ZoneSummary>,
}

/// One entry of the zone listing
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneSummary {
    pub zone: String,
    #[serde(rename = "type", default)]
    pub zone_type: String,
    #[serde(default)]
    pub activation_state: String,
    #[serde(default)]
    pub contract_id: String,
}

/// Full zone as returned by the zone endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneResponse {
    pub zone: String,
    #[serde(rename = "type", default)]
    pub zone_type: String,
    #[serde(default)]
    pub sign_and_serve: bool,
    #[serde(default)]
    pub sign_and_serve_algorithm: Option<String>,
    #[serde(default)]
    pub masters: Vec<String>,
    #[serde(default)]
    pub tsig_key: Option<TsigKey>,
    #[serde(default)]
    pub activation_state: String,
}

/// Acknowledgement of a bulk deletion request
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkDeleteResponse {
    #[serde(default)]
    pub request_id: String,
    #[serde(default)]
    pub expiration_date: String,
}

#[derive(Debug, Serialize)]
struct ZoneNameList<'a> {
    zones: &'a [String],
}

#[derive(Debug, Default, Deserialize)]
struct AuthoritiesResponse {
    #[serde(default)]
    contracts: Vec<ContractAuthorities>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContractAuthorities {
    #[serde(default)]
    contract_id: String,
    #[serde(default)]
    authorities: Vec<String>,
}

/// Signed Config DNS v2 client
#[derive(Debug, Clone)]
pub struct ConfigDnsClient {
    http: reqwest::Client,
    base_url: Url,
    credentials: EdgeGridCredentials,
}

impl ConfigDnsClient {
    /// Create a client talking to `https://{credentials.host}`
    pub fn new(credentials: EdgeGridCredentials) -> Result<Self> {
        let base_url = format!("https://{}", credentials.host);
        Self::with_base_url(credentials, &base_url)
    }

    /// Create a client talking to an explicit base URL
    pub fn with_base_url(credentials: EdgeGridCredentials, base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| Error::config(format!("Invalid Edge DNS API URL {}: {}", base_url, e)))?;
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url,
            credentials,
        })
    }

    /// List zones
    pub async fn list_zones(&self, query: &ZoneListQuery) -> Result<ZoneListResponse> {
        let mut params = Vec::new();
        if !query.contract_ids.is_empty() {
            params.push(("contractIds", query.contract_ids.join(",")));
        }
        if let Some(types) = &query.types {
            params.push(("types", types.clone()));
        }
        if let Some(search) = query.search.as_ref().filter(|s| !s.is_empty()) {
            params.push(("search", search.clone()));
        }
        if query.show_all {
            params.push(("showAll", "true".to_string()));
        }
        if let Some(sort_by) = &query.sort_by {
            params.push(("sortBy", sort_by.clone()));
        }

        let url = self.url(&["config-dns", "v2", "zones"], &params)?;
        self.request_json(Method::GET, url, None).await
    }

    /// Create a single zone
    pub async fn create_zone(&self, zone: &ZoneCreate, placement: &ZonePlacement) -> Result<()> {
        let url = self.url(
            &["config-dns", "v2", "zones"],
            &[
                ("contractId", placement.contract_id.clone()),
                ("gid", placement.group_id.to_string()),
            ],
        )?;
        let body = serde_json::to_vec(zone)?;
        self.request(Method::POST, url, Some(body)).await?;
        Ok(())
    }

    /// Submit a bulk zone deletion
    pub async fn delete_bulk_zones(&self, zones: &[String]) -> Result<BulkDeleteResponse> {
        let url = self.url(&["config-dns", "v2", "zones", "delete-requests"], &[])?;
        let body = serde_json::to_vec(&ZoneNameList { zones })?;
        self.request_json(Method::POST, url, Some(body)).await
    }

    /// Read a single zone
    pub async fn get_zone(&self, zone: &str) -> Result<ZoneResponse> {
        let url = self.url(&["config-dns", "v2", "zones", zone], &[])?;
        self.request_json(Method::GET, url, None).await
    }

    /// Read the TSIG key of a zone
    pub async fn get_zone_key(&self, zone: &str) -> Result<TsigKey> {
        let url = self.url(&["config-dns", "v2", "zones", zone, "key"], &[])?;
        self.request_json(Method::GET, url, None).await
    }

    /// Authoritative name servers assigned to a contract
    pub async fn get_authorities(&self, contract_id: &str) -> Result<Vec<String>> {
        let url = self.url(
            &["config-dns", "v2", "data", "authorities"],
            &[("contractIds", contract_id.to_string())],
        )?;
        let response: AuthoritiesResponse = self.request_json(Method::GET, url, None).await?;

        let authorities = response
            .contracts
            .into_iter()
            .find(|c| c.contract_id == contract_id)
            .map(|c| c.authorities)
            .unwrap_or_default();
        Ok(authorities)
    }

    fn url(&self, segments: &[&str], params: &[(&str, String)]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::config(format!("Edge DNS API URL cannot be a base: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);

        let mut pairs: Vec<(&str, &str)> = params.iter().map(|(k, v)| (*k, v.as_str())).collect();
        if let Some(key) = &self.credentials.account_key {
            pairs.push(("accountSwitchKey", key.as_str()));
        }
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        Ok(url)
    }

    async fn request_json<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<Vec<u8>>,
    ) -> Result<T> {
        let response = self.request(method, url, body).await?;
        response
            .json()
            .await
            .map_err(|e| Error::provider(PROVIDER, format!("Failed to parse response: {}", e)))
    }

    async fn request(
        &self,
        method: Method,
        url: Url,
        body: Option<Vec<u8>>,
    ) -> Result<reqwest::Response> {
        let body = body.unwrap_or_default();
        let authorization = self.credentials.authorization(method.as_str(), &url, &body);
        tracing::debug!("{} {}", method, url.path());

        let mut request = self
            .http
            .request(method.clone(), url.clone())
            .header("Authorization", authorization)
            .header("Accept", "application/json");
        if !body.is_empty() {
            request = request.header("Content-Type", "application/json").body(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::http(format!("{} {} failed: {}", method, url.path(), e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read error response".to_string());
        Err(status_error(status, url.path(), &error_text))
    }
}

/// Map a non-success status to an error
fn status_error(status: StatusCode, path: &str, error_text: &str) -> Error {
    match status.as_u16() {
        401 | 403 => Error::auth(format!(
            "Invalid EdgeGrid credentials or insufficient permissions for {}. Status: {}",
            path, status
        )),
        404 => Error::not_found(format!("{} ({})", path, error_text)),
        429 => Error::rate_limited(format!(
            "Rate limit exceeded for {}. Please retry later. Status: {}",
            path, status
        )),
        500..=599 => Error::provider(
            PROVIDER,
            format!("Edge DNS server error (transient): {} - {}", status, error_text),
        ),
        _ => Error::provider(
            PROVIDER,
            format!("Request to {} failed: {} - {}", path, status, error_text),
        ),
    }
}
