// # EdgeGrid Authentication
//
// Akamai OPEN APIs authenticate every request with an `EG1-HMAC-SHA256`
// Authorization header computed from the request itself.
//
// ## Signature
//
// ```text
// auth_header  = "EG1-HMAC-SHA256 client_token=..;access_token=..;timestamp=..;nonce=..;"
// signing_key  = base64(HMAC-SHA256(client_secret, timestamp))
// data_to_sign = method \t scheme \t host \t path?query \t "" \t content_hash \t auth_header
// signature    = base64(HMAC-SHA256(signing_key, data_to_sign))
// ```
//
// `content_hash` is the base64 SHA-256 of a POST body truncated to
// `max_body` bytes, and empty for every other request.
//
// ## Security
//
// Neither the client secret nor the tokens may appear in logs; the Debug
// implementation redacts them.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use url::Url;
use zonesync_core::config::EdgeGridSettings;
use zonesync_core::{Error, Result};

type HmacSha256 = Hmac<Sha256>;

/// Default number of body bytes covered by the signature
pub const DEFAULT_MAX_BODY: usize = 131_072;

/// Environment variable overriding `max_body`
pub const MAX_BODY_ENV: &str = "AKAMAI_MAX_BODY";

/// Environment variable providing an account switch key
pub const ACCOUNT_KEY_ENV: &str = "AKAMAI_ACCOUNT_KEY";

/// Resolved EdgeGrid credentials
#[derive(Clone, PartialEq, Eq)]
pub struct EdgeGridCredentials {
    /// API host, without scheme
    pub host: String,
    pub client_token: String,
    pub client_secret: String,
    pub access_token: String,
    /// Body bytes covered by the signature
    pub max_body: usize,
    /// Account switch key, sent as `accountSwitchKey`
    pub account_key: Option<String>,
}

// Custom Debug implementation that hides the secrets
impl std::fmt::Debug for EdgeGridCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EdgeGridCredentials")
            .field("host", &self.host)
            .field("client_token", &"<REDACTED>")
            .field("client_secret", &"<REDACTED>")
            .field("access_token", &"<REDACTED>")
            .field("max_body", &self.max_body)
            .field("account_key", &self.account_key.as_ref().map(|_| "<REDACTED>"))
            .finish()
    }
}

impl EdgeGridCredentials {
    pub fn new(
        host: impl Into<String>,
        client_token: impl Into<String>,
        client_secret: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            host: normalize_host(&host.into()),
            client_token: client_token.into(),
            client_secret: client_secret.into(),
            access_token: access_token.into(),
            max_body: DEFAULT_MAX_BODY,
            account_key: None,
        }
    }

    /// Resolve credentials from configuration
    ///
    /// Inline values win when all four are present. Otherwise the `.edgerc`
    /// file is read. `lookup_env` supplies the `AKAMAI_MAX_BODY` and
    /// `AKAMAI_ACCOUNT_KEY` overrides for inline credentials.
    pub fn from_settings(
        settings: &EdgeGridSettings,
        lookup_env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        if !settings.has_inline_credentials() {
            return crate::edgerc::load(
                settings.edgerc_path.as_deref(),
                settings.edgerc_section.as_deref(),
            );
        }

        let mut credentials = Self::new(
            &settings.host,
            &settings.client_token,
            &settings.client_secret,
            &settings.access_token,
        );
        credentials.account_key = settings.account_key.clone();
        if let Some(max_body) = settings.max_body {
            credentials.max_body = max_body;
        }

        if let Some(value) = lookup_env(MAX_BODY_ENV) {
            match value.trim().parse::<usize>() {
                Ok(max_body) => {
                    tracing::debug!("EdgeGrid max body set to {}", max_body);
                    credentials.max_body = max_body;
                }
                Err(_) => tracing::warn!("Ignoring invalid {}: {}", MAX_BODY_ENV, value),
            }
        }
        if let Some(value) = lookup_env(ACCOUNT_KEY_ENV) {
            if !value.is_empty() {
                tracing::debug!("EdgeGrid account switch key applied");
                credentials.account_key = Some(value);
            }
        }

        Ok(credentials)
    }

    /// Build the Authorization header for a request with a fresh timestamp
    /// and nonce
    pub fn authorization(&self, method: &str, url: &Url, body: &[u8]) -> String {
        let timestamp = chrono::Utc::now().format("%Y%m%dT%H:%M:%S+0000").to_string();
        let nonce = uuid::Uuid::new_v4().to_string();
        self.sign(method, url, body, &timestamp, &nonce)
    }

    /// Build the Authorization header for fixed timestamp and nonce
    pub fn sign(&self, method: &str, url: &Url, body: &[u8], timestamp: &str, nonce: &str) -> String {
        let auth_header = format!(
            "EG1-HMAC-SHA256 client_token={};access_token={};timestamp={};nonce={};",
            self.client_token, self.access_token, timestamp, nonce
        );

        let host = match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            (None, _) => String::new(),
        };
        let path_and_query = match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        };

        let data_to_sign = [
            method.to_uppercase().as_str(),
            url.scheme(),
            host.to_lowercase().as_str(),
            path_and_query.as_str(),
            "",
            self.content_hash(method, body).as_str(),
            auth_header.as_str(),
        ]
        .join("\t");

        let signing_key = BASE64.encode(hmac_sha256(self.client_secret.as_bytes(), timestamp));
        let signature = BASE64.encode(hmac_sha256(signing_key.as_bytes(), &data_to_sign));

        format!("{}signature={}", auth_header, signature)
    }

    fn content_hash(&self, method: &str, body: &[u8]) -> String {
        if !method.eq_ignore_ascii_case("POST") || body.is_empty() {
            return String::new();
        }
        let covered = &body[..body.len().min(self.max_body)];
        BASE64.encode(Sha256::digest(covered))
    }
}

/// Validate that no credential value is missing
pub(crate) fn require_complete(credentials: &EdgeGridCredentials, origin: &str) -> Result<()> {
    let missing: Vec<&str> = [
        ("host", credentials.host.is_empty()),
        ("client_token", credentials.client_token.is_empty()),
        ("client_secret", credentials.client_secret.is_empty()),
        ("access_token", credentials.access_token.is_empty()),
    ]
    .iter()
    .filter(|(_, missing)| *missing)
    .map(|(name, _)| *name)
    .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::config(format!(
            "{}: missing EdgeGrid {}",
            origin,
            missing.join(", ")
        )))
    }
}

fn normalize_host(host: &str) -> String {
    host.trim()
        .trim_start_matches("https://")
        .trim_end_matches('/')
        .to_string()
}

fn hmac_sha256(key: &[u8], data: &str) -> Vec<u8> {
    // HMAC accepts keys of any length
    let mut mac = match HmacSha256::new_from_slice(key) {
        Ok(mac) => mac,
        Err(_) => return Vec::new(),
    };
    mac.update(data.as_bytes());
    mac.finalize().into_bytes().to_vec()
}
