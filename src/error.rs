//! Error types for refsync.

/// Errors that can occur while talking to Readwise, Zotero, or the
/// translation server, or while handling local input/output.
#[derive(Debug, thiserror::Error)]
pub enum RefsyncError {
    /// HTTP request failed (network, timeout, etc.)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A remote API returned an error status code.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// Missing or invalid configuration (credentials, config file).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failed to parse an API response.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// The translation server returned no usable metadata.
    #[error("Not found: {0}")]
    NotFound(String),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Local file I/O error (input files, output file).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias for Results using [`RefsyncError`].
pub type Result<T> = std::result::Result<T, RefsyncError>;
