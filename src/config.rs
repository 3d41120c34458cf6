use std::path::Path;

use regex::Regex;
use url::Url;

use crate::error::Error;

/// Validation policy, loaded from `.hrefcheck.toml` and overridden by CLI
/// flags. The ignore list and site host are open-ended policy injected into
/// the checker as predicates; rules can be added without touching it.
#[derive(Debug, Default)]
pub struct Policy {
    /// Tolerate `href="#"` on anchors.
    pub allow_hash_href: bool,
    /// Tolerate anchors without an href attribute.
    pub allow_missing_href: bool,
    /// Audit `integrity`/`crossorigin` on external stylesheet links.
    pub check_sri: bool,
    /// Flag plain `http://` references.
    pub enforce_https: bool,
    /// Tolerate `mailto:` with an empty address.
    pub ignore_empty_mailto: bool,
    /// Compiled ignore patterns; matching references are skipped outright.
    ignore_patterns: Vec<Regex>,
    /// Host of the configured site URL; absolute references to it are
    /// classified as internal.
    site_host: Option<String>,
}

/// Raw TOML structure for `.hrefcheck.toml`.
#[derive(serde::Deserialize)]
struct HrefcheckTomlConfig {
    #[serde(default)]
    allow_hash_href: bool,
    #[serde(default)]
    allow_missing_href: bool,
    #[serde(default)]
    check_sri: bool,
    #[serde(default)]
    enforce_https: bool,
    #[serde(default)]
    ignore_empty_mailto: bool,
    #[serde(default)]
    ignore_urls: Vec<String>,
    #[serde(default)]
    site_url: Option<String>,
}

impl Policy {
    /// Load policy from `.hrefcheck.toml` in the given root directory.
    /// Returns the default policy if the file doesn't exist. Returns an
    /// error if the file exists but is malformed; never silently falls back
    /// to defaults when the user wrote a config file.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if reading fails (other than not-found),
    /// `Error::TomlDe` if the TOML is malformed, `Error::InvalidIgnorePattern`
    /// if an ignore entry doesn't compile, or `Error::InvalidSiteUrl` if the
    /// site URL has no usable host.
    pub fn load(root: &Path) -> Result<Self, Error> {
        let path = root.join(".hrefcheck.toml");
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(Error::Io(e)),
        };

        let raw: HrefcheckTomlConfig = toml::from_str(&content)?;
        let ignore_patterns = compile_ignore_patterns(&raw.ignore_urls)?;
        let site_host = match &raw.site_url {
            Some(site_url) => Some(host_of(site_url)?),
            None => None,
        };

        Ok(Self {
            allow_hash_href: raw.allow_hash_href,
            allow_missing_href: raw.allow_missing_href,
            check_sri: raw.check_sri,
            enforce_https: raw.enforce_https,
            ignore_empty_mailto: raw.ignore_empty_mailto,
            ignore_patterns,
            site_host,
        })
    }

    /// Check whether a reference is on the explicit ignore list.
    /// Ignored references are terminal: no diagnostic, no further checks.
    pub fn is_ignored(&self, raw: &str) -> bool {
        self.ignore_patterns.iter().any(|p| p.is_match(raw))
    }

    /// Host that absolute references may target while staying internal.
    pub fn site_host(&self) -> Option<&str> {
        self.site_host.as_deref()
    }

    /// Build a policy with the given ignore patterns (tests and CLI merges).
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidIgnorePattern` if a pattern doesn't compile.
    pub fn with_ignore_patterns(mut self, patterns: &[String]) -> Result<Self, Error> {
        let mut compiled = compile_ignore_patterns(patterns)?;
        self.ignore_patterns.append(&mut compiled);
        Ok(self)
    }
}

/// Compile the ignore list, attributing failures to the offending pattern.
fn compile_ignore_patterns(patterns: &[String]) -> Result<Vec<Regex>, Error> {
    patterns
        .iter()
        .map(|p| {
            Regex::new(p).map_err(|e| Error::InvalidIgnorePattern {
                pattern: p.clone(),
                reason: e.to_string(),
            })
        })
        .collect()
}

/// Extract the host from a configured site URL.
fn host_of(site_url: &str) -> Result<String, Error> {
    let parsed = Url::parse(site_url).map_err(|e| Error::InvalidSiteUrl {
        reason: e.to_string(),
        url: site_url.to_string(),
    })?;

    match parsed.host_str() {
        Some(host) => Ok(host.to_string()),
        None => Err(Error::InvalidSiteUrl {
            reason: "no host component".to_string(),
            url: site_url.to_string(),
        }),
    }
}
