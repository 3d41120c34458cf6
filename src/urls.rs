/// URL descriptor: derived facts about one raw reference string.
use url::Url;

/// Base used to validate and classify references that have no scheme.
/// The host is reserved under RFC 2606 and can never collide with a real
/// site, so a joined reference that still points at it must be relative.
const SYNTHETIC_BASE: &str = "https://hrefcheck.invalid/";

/// Immutable view over a raw href/src attribute. Pure computation over the
/// input string, no side effects.
///
/// At dispatch time exactly one classification holds per reference:
/// missing, hash-only, scheme-special, internal, or external. The checker
/// derives that classification from these flags.
#[derive(Debug, Clone)]
pub struct UrlFacts {
    /// Fragment portion (`#identifier` suffix), without the `#`.
    pub fragment: Option<String>,
    /// True when the reference resolves within the same document set:
    /// relative path, fragment-only, or same-host absolute.
    pub internal: bool,
    /// True for schemes that are neither http(s) nor internal-relevant
    /// (`ftp`, `data`, `javascript`, `mailto`, `tel`, ...). These are
    /// skipped after scheme handling; fetch libraries cannot reliably
    /// probe them.
    pub non_http_remote: bool,
    /// Path component, or the opaque payload for `mailto`/`tel`.
    pub path: String,
    /// The raw attribute string, trimmed.
    pub raw: String,
    /// True when the reference targets a different host over http(s).
    pub remote: bool,
    /// Lower-cased scheme token. Empty for relative references.
    pub scheme: String,
    /// False when the raw string fails general URL syntax rules.
    pub valid: bool,
}

impl UrlFacts {
    /// Derive facts from a raw attribute string. `site_host` is the host of
    /// the configured site URL; absolute references to it count as internal.
    ///
    /// # Panics
    ///
    /// Panics if the hardcoded synthetic base URL is invalid (compile-time
    /// invariant).
    pub fn derive(raw: &str, site_host: Option<&str>) -> Self {
        let trimmed = raw.trim();

        match Url::parse(trimmed) {
            Ok(parsed) => Self::from_absolute(trimmed, &parsed, site_host),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let base = Url::parse(SYNTHETIC_BASE).expect("valid base url");
                match base.join(trimmed) {
                    Ok(joined) => Self::from_relative(trimmed, &joined, site_host),
                    Err(_) => Self::invalid(trimmed),
                }
            },
            Err(_) => Self::invalid(trimmed),
        }
    }

    /// Facts for a reference that parsed as an absolute URL.
    fn from_absolute(raw: &str, parsed: &Url, site_host: Option<&str>) -> Self {
        let scheme = parsed.scheme().to_string();

        if scheme == "http" || scheme == "https" {
            let same_host = match (parsed.host_str(), site_host) {
                (Some(host), Some(site)) => host.eq_ignore_ascii_case(site),
                _ => false,
            };
            Self {
                fragment: parsed.fragment().map(String::from),
                internal: same_host,
                non_http_remote: false,
                path: parsed.path().to_string(),
                raw: raw.to_string(),
                remote: !same_host,
                scheme,
                valid: true,
            }
        } else {
            // mailto, tel, ftp, data, javascript, and anything else opaque.
            // path() carries the payload for mailto/tel.
            Self {
                fragment: parsed.fragment().map(String::from),
                internal: false,
                non_http_remote: true,
                path: parsed.path().to_string(),
                raw: raw.to_string(),
                remote: false,
                scheme,
                valid: true,
            }
        }
    }

    /// Facts for a scheme-less reference validated by joining against the
    /// synthetic base. Scheme-relative references (`//host/...`) land on a
    /// different host after the join and are classified like absolutes.
    fn from_relative(raw: &str, joined: &Url, site_host: Option<&str>) -> Self {
        let joined_host = joined.host_str().unwrap_or("");
        if !joined_host.eq_ignore_ascii_case("hrefcheck.invalid") {
            let same_host = site_host.is_some_and(|site| joined_host.eq_ignore_ascii_case(site));
            return Self {
                fragment: joined.fragment().map(String::from),
                internal: same_host,
                non_http_remote: false,
                path: joined.path().to_string(),
                raw: raw.to_string(),
                remote: !same_host,
                scheme: String::new(),
                valid: true,
            };
        }

        // Keep the raw (unnormalized) path so internal resolution sees the
        // reference exactly as written, including a missing trailing slash.
        // Query and fragment are not part of the path portion.
        let path_portion = raw.split(['#', '?']).next().unwrap_or("");
        Self {
            fragment: joined.fragment().map(String::from),
            internal: true,
            non_http_remote: false,
            path: path_portion.to_string(),
            raw: raw.to_string(),
            remote: false,
            scheme: String::new(),
            valid: true,
        }
    }

    /// Facts for a reference that failed URL syntax rules.
    fn invalid(raw: &str) -> Self {
        Self {
            fragment: None,
            internal: false,
            non_http_remote: false,
            path: String::new(),
            raw: raw.to_string(),
            remote: false,
            scheme: String::new(),
            valid: false,
        }
    }
}
