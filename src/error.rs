/// Crate-level error types for hrefcheck.
use std::path::PathBuf;

/// Hard failures only. Validation findings about document content are never
/// errors; they become `Diagnostic`s and the run continues. Everything here
/// is a precondition violation: the tool was asked to check something it
/// cannot read or was configured with something it cannot use.
#[allow(clippy::error_impl_error, reason = "crate-internal error type in binary")]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A document matched the scan filter but could not be read.
    #[error("cannot read document {}: {reason}", path.display())]
    DocumentUnreadable {
        /// Path to the unreadable document.
        path: PathBuf,
        /// Description of the read failure.
        reason: String,
    },

    /// The HTTP client for external resolution could not be constructed.
    #[error("http client setup failed: {reason}")]
    HttpClient {
        /// Description of the setup failure.
        reason: String,
    },

    /// An entry in the configured ignore list is not a valid regex.
    #[error("invalid ignore pattern `{pattern}`: {reason}")]
    InvalidIgnorePattern {
        /// The pattern as written in the config.
        pattern: String,
        /// Regex compile error text.
        reason: String,
    },

    /// The configured site URL cannot be parsed or has no host.
    #[error("invalid site_url `{url}`: {reason}")]
    InvalidSiteUrl {
        /// Description of the parse failure.
        reason: String,
        /// The site URL as written in the config.
        url: String,
    },

    /// Underlying I/O error from the filesystem.
    #[error("io: {0}")]
    Io(
        /// The wrapped I/O error.
        #[from]
        std::io::Error,
    ),

    /// Config file deserialization failed.
    #[error("toml deserialize: {0}")]
    TomlDe(
        /// The wrapped TOML deserialization error.
        #[from]
        toml::de::Error,
    ),

    /// The requested output format is not recognized.
    #[error("unknown output format `{format}` (expected `text` or `json`)")]
    UnknownFormat {
        /// The format string as given on the command line.
        format: String,
    },
}
