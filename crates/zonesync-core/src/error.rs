//! Error types for the zone synchronization system
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for zonesync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the zone synchronization system
#[derive(Error, Debug)]
pub enum Error {
    /// Registrar-related errors
    #[error("Registrar error: {0}")]
    Registrar(String),

    /// Edge DNS (hosting provider) related errors
    #[error("Edge DNS error: {0}")]
    EdgeDns(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client errors (from provider APIs)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Authentication errors
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Rate limiting errors
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Zone or resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Backend-specific error
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Backend name
        provider: String,
        /// Error message
        message: String,
    },

    /// A reconciliation cycle could not read one side of the comparison
    #[error("Failed to fetch {side}: {source}")]
    Fetch {
        /// Which backend failed
        side: FetchSide,
        /// Underlying backend error
        #[source]
        source: Box<Error>,
    },

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

/// Backend whose listing failed during a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchSide {
    /// Edge DNS zone listing
    EdgeDns,
    /// Registrar domain listing
    Registrar,
}

impl std::fmt::Display for FetchSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchSide::EdgeDns => write!(f, "edge DNS zones"),
            FetchSide::Registrar => write!(f, "registrar domains"),
        }
    }
}

impl Error {
    /// Create a registrar error
    pub fn registrar(msg: impl Into<String>) -> Self {
        Self::Registrar(msg.into())
    }

    /// Create an Edge DNS error
    pub fn edge_dns(msg: impl Into<String>) -> Self {
        Self::EdgeDns(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a rate limit error
    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::RateLimited(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a backend-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }
}

impl Error {
    /// Wrap a backend listing failure
    pub fn fetch(side: FetchSide, source: Error) -> Self {
        Self::Fetch {
            side,
            source: Box::new(source),
        }
    }

    /// Side of a fetch failure, if this is one
    pub fn fetch_side(&self) -> Option<FetchSide> {
        match self {
            Self::Fetch { side, .. } => Some(*side),
            _ => None,
        }
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
