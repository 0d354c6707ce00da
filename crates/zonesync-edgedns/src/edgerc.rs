//! `.edgerc` credential files
//!
//! INI style file with one section per credential set:
//!
//! ```text
//! [default]
//! host = akab-xxxx.luna.akamaiapis.net
//! client_token = akab-xxxx
//! client_secret = xxxx
//! access_token = akab-xxxx
//! max-body = 131072
//! ```
//!
//! Lines starting with `#` or `;` are comments. Keys accept both `_` and `-`.

use std::collections::HashMap;
use std::path::PathBuf;

use zonesync_core::{Error, Result};

use crate::edgegrid::{DEFAULT_MAX_BODY, EdgeGridCredentials, require_complete};

/// Section used when none is configured
pub const DEFAULT_SECTION: &str = "default";

/// `~/.edgerc`, if a home directory is known
pub fn default_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".edgerc"))
}

/// Read credentials from an `.edgerc` file
///
/// `path` defaults to `~/.edgerc` and `section` to `default`.
pub fn load(path: Option<&str>, section: Option<&str>) -> Result<EdgeGridCredentials> {
    let path = match path {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => default_path()
            .ok_or_else(|| Error::config("No .edgerc path given and no home directory found"))?,
    };
    let section = section.filter(|s| !s.is_empty()).unwrap_or(DEFAULT_SECTION);

    tracing::debug!("Reading EdgeGrid credentials from {} [{}]", path.display(), section);
    let content = std::fs::read_to_string(&path).map_err(|e| {
        Error::config(format!("Failed to read .edgerc {}: {}", path.display(), e))
    })?;

    parse(&content, section)
}

/// Parse one section of `.edgerc` content
pub fn parse(content: &str, section: &str) -> Result<EdgeGridCredentials> {
    let sections = parse_sections(content);
    let values = sections
        .get(section)
        .ok_or_else(|| Error::config(format!("Section [{}] not found in .edgerc", section)))?;

    let get = |key: &str| values.get(key).cloned().unwrap_or_default();

    let mut credentials = EdgeGridCredentials::new(
        get("host"),
        get("client_token"),
        get("client_secret"),
        get("access_token"),
    );
    credentials.max_body = match values.get("max_body") {
        Some(raw) => raw
            .parse()
            .map_err(|_| Error::config(format!("Invalid max-body in .edgerc: {}", raw)))?,
        None => DEFAULT_MAX_BODY,
    };
    credentials.account_key = values.get("account_key").filter(|k| !k.is_empty()).cloned();

    require_complete(&credentials, &format!(".edgerc section [{}]", section))?;
    Ok(credentials)
}

fn parse_sections(content: &str) -> HashMap<String, HashMap<String, String>> {
    let mut sections: HashMap<String, HashMap<String, String>> = HashMap::new();
    let mut current: Option<String> = None;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            let name = name.trim().to_string();
            sections.entry(name.clone()).or_default();
            current = Some(name);
            continue;
        }

        let (Some(section), Some((key, value))) = (current.as_ref(), line.split_once('=')) else {
            continue;
        };
        let key = key.trim().to_lowercase().replace('-', "_");
        let value = value.trim().trim_matches('"').to_string();
        sections.entry(section.clone()).or_default().insert(key, value);
    }

    sections
}
