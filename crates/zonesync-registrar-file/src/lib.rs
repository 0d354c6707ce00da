// # Domain List File Registrar
//
// A registrar backed by a domain list kept in sync on local disk (for example
// pulled from a registrar's SFTP drop by an external job).
//
// ## File Format
//
// One domain per line. Blank lines and `#`, `//` or `/* */` comments are
// ignored and surrounding whitespace is trimmed. BIND style secondary
// declarations are accepted as well, on one line or spread over several:
//
// ```text
// # plain entries
// example.com
// example.org   # trailing comment
//
// zone "example.net" in { type slave; file "db.example.net"; masters { 192.0.2.1; }; };
// zone "example.info" in {
//     type secondary;
//     masters { 192.0.2.1; };
// };
// ```
//
// Other statements (`acl`, `options`, primary zones) are skipped, as are
// lines that are not valid domain names. Names are lowercased and a trailing
// dot is dropped. Duplicates collapse to their first occurrence.
//
// ## Caching
//
// The parsed list is cached and the file is read again once the cached copy is
// older than the refresh interval. A failed read is returned to the engine and
// leaves the cache untouched.
//
// ## Limitations
//
// Master addresses come from configuration. DNSSEC algorithms and TSIG keys
// are not known to this registrar; the trait defaults apply.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;
use zonesync_core::config::RegistrarConfig;
use zonesync_core::traits::{Registrar, RegistrarFactory, TsigKey};
use zonesync_core::{Error, Result};

/// Default refresh interval for the cached domain list
pub const DEFAULT_REFRESH: Duration = Duration::from_secs(600);

struct CachedList {
    domains: Vec<String>,
    loaded_at: Instant,
}

/// Registrar reading its domains from a local file
pub struct FileRegistrar {
    path: PathBuf,
    master_ips: Vec<String>,
    refresh: Duration,
    cache: Mutex<Option<CachedList>>,
}

impl FileRegistrar {
    pub fn new(path: impl Into<PathBuf>, master_ips: Vec<String>) -> Self {
        Self {
            path: path.into(),
            master_ips,
            refresh: DEFAULT_REFRESH,
            cache: Mutex::new(None),
        }
    }

    /// Set how long a parsed list is served before the file is read again
    pub fn with_refresh(mut self, refresh: Duration) -> Self {
        self.refresh = refresh;
        self
    }

    async fn load(&self) -> Result<Vec<String>> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            Error::registrar(format!(
                "Failed to read domain list {}: {}",
                self.path.display(),
                e
            ))
        })?;
        let domains = parse_domain_list(&content);
        tracing::info!(
            "Loaded {} domains from {}",
            domains.len(),
            self.path.display()
        );
        Ok(domains)
    }
}

#[async_trait]
impl Registrar for FileRegistrar {
    async fn get_domains(&self) -> Result<Vec<String>> {
        let mut cache = self.cache.lock().await;

        if let Some(cached) = cache.as_ref() {
            if cached.loaded_at.elapsed() < self.refresh {
                tracing::debug!("Serving cached domain list ({} domains)", cached.domains.len());
                return Ok(cached.domains.clone());
            }
        }

        let domains = self.load().await?;
        *cache = Some(CachedList {
            domains: domains.clone(),
            loaded_at: Instant::now(),
        });
        Ok(domains)
    }

    async fn get_master_ips(&self) -> Result<Vec<String>> {
        Ok(self.master_ips.clone())
    }

    async fn get_serve_algorithm(&self, domain: &str) -> Result<String> {
        tracing::debug!("File registrar has no DNSSEC data for {}", domain);
        Ok(String::new())
    }

    async fn get_tsig_key(&self, domain: &str) -> Result<Option<TsigKey>> {
        tracing::debug!("File registrar has no TSIG key for {}", domain);
        Ok(None)
    }

    fn registrar_name(&self) -> &'static str {
        "file"
    }
}

/// Parse domain list content
///
/// Plain lines must be a single domain name. Lines that open a BIND
/// statement are collected until the statement closes; only `zone` statements
/// of type slave or secondary contribute a domain. Anything else is skipped
/// with a warning.
pub fn parse_domain_list(content: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut domains = Vec::new();
    let mut statement = String::new();
    let mut depth: i64 = 0;
    let mut in_block_comment = false;

    for raw in content.lines() {
        let line = strip_comments(raw, &mut in_block_comment);
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if statement.is_empty() && !is_statement_text(line) {
            match normalize_domain(line) {
                Some(domain) => {
                    if seen.insert(domain.clone()) {
                        domains.push(domain);
                    }
                }
                None => tracing::warn!("Skipping invalid domain name: {}", line),
            }
            continue;
        }

        statement.push(' ');
        statement.push_str(line);
        depth += line.matches('{').count() as i64 - line.matches('}').count() as i64;
        if depth > 0 {
            continue;
        }
        if !starts_with_keyword(&statement) {
            tracing::warn!("Skipping unrecognized line: {}", statement.trim());
        } else if !line.ends_with(';') {
            continue;
        } else if let Some(domain) = parse_zone_statement(&statement) {
            if seen.insert(domain.clone()) {
                domains.push(domain);
            }
        }
        statement.clear();
        depth = 0;
    }

    if !statement.trim().is_empty() {
        tracing::warn!("Skipping unterminated statement: {}", statement.trim());
    }

    domains
}

/// Remove `#`, `//` and `/* */` comments from a line
fn strip_comments(line: &str, in_block_comment: &mut bool) -> String {
    let mut out = String::with_capacity(line.len());
    let mut rest = line;

    loop {
        if *in_block_comment {
            match rest.find("*/") {
                Some(end) => {
                    *in_block_comment = false;
                    rest = &rest[end + 2..];
                }
                None => return out,
            }
        }

        let cut = [rest.find('#'), rest.find("//"), rest.find("/*")]
            .into_iter()
            .flatten()
            .min();
        match cut {
            Some(at) => {
                out.push_str(&rest[..at]);
                if rest[at..].starts_with("/*") {
                    *in_block_comment = true;
                    rest = &rest[at + 2..];
                } else {
                    return out;
                }
            }
            None => {
                out.push_str(rest);
                return out;
            }
        }
    }
}

/// Text that belongs to a BIND statement rather than a bare domain
fn is_statement_text(line: &str) -> bool {
    line.contains(|c: char| c.is_whitespace() || matches!(c, '{' | '}' | ';' | '"'))
}

/// Statement keywords that may span several lines
const STATEMENT_KEYWORDS: &[&str] = &[
    "acl", "controls", "include", "key", "logging", "masters", "options", "primaries",
    "server", "view", "zone",
];

fn starts_with_keyword(statement: &str) -> bool {
    statement
        .split(|c: char| c.is_whitespace() || c == '{')
        .find(|t| !t.is_empty())
        .is_some_and(|first| STATEMENT_KEYWORDS.iter().any(|keyword| *keyword == first))
}

/// Name of a secondary zone declared as `zone "name" ... { type slave; ... }`
fn parse_zone_statement(statement: &str) -> Option<String> {
    let tokens: Vec<&str> = statement
        .split(|c: char| c.is_whitespace() || matches!(c, '{' | '}' | ';'))
        .filter(|t| !t.is_empty())
        .collect();

    if tokens.first() != Some(&"zone") {
        tracing::debug!("Skipping statement: {}", statement.trim());
        return None;
    }
    let secondary = tokens
        .windows(2)
        .any(|pair| pair[0] == "type" && matches!(pair[1], "slave" | "secondary"));
    if !secondary {
        tracing::debug!("Skipping non-secondary zone: {}", statement.trim());
        return None;
    }

    let name = tokens.get(1).map(|t| t.trim_matches('"')).unwrap_or_default();
    let domain = normalize_domain(name);
    if domain.is_none() {
        tracing::warn!("Skipping zone with invalid name: {:?}", name);
    }
    domain
}

/// Lowercased domain without its trailing dot, if `name` is a valid
/// multi-label host name
fn normalize_domain(name: &str) -> Option<String> {
    let name = name.strip_suffix('.').unwrap_or(name).to_ascii_lowercase();
    if name.is_empty() || name.len() > 253 {
        return None;
    }

    let labels: Vec<&str> = name.split('.').collect();
    let valid = labels.len() >= 2
        && labels.iter().all(|label| {
            !label.is_empty()
                && label.len() <= 63
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        });
    valid.then_some(name)
}

/// Factory for creating file registrars
pub struct FileRegistrarFactory;

impl RegistrarFactory for FileRegistrarFactory {
    fn create(&self, config: &RegistrarConfig) -> Result<Box<dyn Registrar>> {
        match config {
            RegistrarConfig::File {
                domains_path,
                master_ips,
                refresh_secs,
            } => {
                if master_ips.is_empty() {
                    return Err(Error::config("File registrar requires one or more master IPs"));
                }
                let registrar = FileRegistrar::new(domains_path, master_ips.clone())
                    .with_refresh(Duration::from_secs(*refresh_secs));
                Ok(Box::new(registrar))
            }
            _ => Err(Error::config("Invalid config type for file registrar")),
        }
    }
}

/// Register the file registrar
///
/// # Example
///
/// ```rust,ignore
/// use zonesync_core::BackendRegistry;
///
/// let registry = BackendRegistry::new();
/// zonesync_registrar_file::register(&registry);
/// ```
pub fn register(registry: &zonesync_core::BackendRegistry) {
    registry.register_registrar("file", Box::new(FileRegistrarFactory));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comments_blanks_and_duplicates() {
        let content = "\n# header\n  example.com  \nexample.org # note\n\nexample.com\n";

        assert_eq!(parse_domain_list(content), vec!["example.com", "example.org"]);
    }

    #[test]
    fn bind_secondary_statements() {
        let content = concat!(
            "zone \"genevarx.com\" in { type slave; file \"/var/dns/zone.genevarx.com.bak\"; masters { 64.124.14.39; }; };\n",
            "zone \"primary.com\" in { type master; file \"db.primary.com\"; };\n",
            "zone \"\" in { type slave; };\n",
            "plain.com\n",
        );

        assert_eq!(parse_domain_list(content), vec!["genevarx.com", "plain.com"]);
    }

    #[test]
    fn bind_drop_with_preamble_and_multiline_blocks() {
        let content = concat!(
            "// MarkMonitor zone transfer drop\n",
            "/* generated nightly\n",
            "   do not edit */\n",
            "acl def_xfer { 64.124.14.39; };\n",
            "options {\n",
            "    directory \"/var/dns\";\n",
            "};\n",
            "zone \"a.com\" in { type slave; file \"/var/dns/a.com\"; masters { 64.124.14.39; }; };\n",
            "zone \"b.com\" in {\n",
            "    type slave;\n",
            "    masters { 64.124.14.39; };\n",
            "};\n",
            "zone \"C.com.\" {\n",
            "    type secondary; // legacy keyword\n",
            "};\n",
            "zone \"internal.com\" in {\n",
            "    type master;\n",
            "};\n",
        );

        assert_eq!(parse_domain_list(content), vec!["a.com", "b.com", "c.com"]);
    }

    #[test]
    fn invalid_names_are_skipped() {
        let content = "MarkMonitor\nexample.com\n-bad.com\nbad..com\nfoo bar.com\nok-1.example.org\n";

        assert_eq!(parse_domain_list(content), vec!["example.com", "ok-1.example.org"]);
    }

    #[test]
    fn unterminated_statement_yields_nothing() {
        let content = "zone \"a.com\" in {\n    type slave;\n";

        assert!(parse_domain_list(content).is_empty());
    }

    #[test]
    fn empty_file_is_empty_list() {
        assert!(parse_domain_list("# nothing here\n\n").is_empty());
    }

    #[test]
    fn factory_needs_file_config() {
        let config = RegistrarConfig::Custom {
            factory: "file".to_string(),
            config: serde_json::Value::Null,
        };
        assert!(matches!(FileRegistrarFactory.create(&config), Err(Error::Config(_))));
    }

    #[test]
    fn register_adds_file_registrar() {
        let registry = zonesync_core::BackendRegistry::new();
        register(&registry);
        assert!(registry.has_registrar("file"));
    }
}
