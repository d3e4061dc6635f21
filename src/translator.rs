//! Zotero translation server client (the metadata resolver).
//!
//! The translation server turns an identifier string (URL, DOI, ISBN,
//! free-text query) into structured bibliographic metadata, and can export
//! previously resolved metadata into a citation format such as BibTeX.

use crate::build_http;
use crate::error::{RefsyncError, Result};
use std::time::Duration;
use tracing::debug;

/// How the translation server should interpret an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Treat the identifier as a web page URL (`/web`).
    Page,
    /// Treat the identifier as a search query — DOI, ISBN, title (`/search`).
    Search,
}

impl Strategy {
    fn path(&self) -> &'static str {
        match self {
            Strategy::Page => "web",
            Strategy::Search => "search",
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strategy::Page => write!(f, "page"),
            Strategy::Search => write!(f, "search"),
        }
    }
}

/// Outcome of the page→search fallback chain for one identifier.
#[derive(Debug, Clone)]
pub enum Resolution {
    /// One of the strategies produced metadata (the raw JSON response body,
    /// suitable for feeding back into [`TranslatorClient::export`]).
    Resolved { via: Strategy, metadata: String },
    /// Both strategies failed.
    Unresolved,
}

/// Client for a Zotero translation server.
#[derive(Clone)]
pub struct TranslatorClient {
    http: reqwest::Client,
    base_url: String,
}

impl TranslatorClient {
    /// Create a client for the translation server at the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: build_http(true),
            base_url: base_url.into(),
        }
    }

    /// Enable or disable TLS certificate verification.
    pub fn with_ssl_verification(mut self, verify: bool) -> Self {
        self.http = build_http(verify);
        self
    }

    /// POST the raw identifier to the strategy's endpoint and return the raw
    /// JSON response body. A transport error or non-2xx response is `Err`.
    pub async fn resolve_raw(&self, identifier: &str, strategy: Strategy) -> Result<String> {
        let url = format!("{}/{}", self.base_url, strategy.path());
        let response = self
            .http
            .post(&url)
            .header("Content-Type", "text/plain")
            .body(identifier.to_string())
            .send()
            .await?;

        let status = response.status().as_u16();
        if (200..300).contains(&status) {
            Ok(response.text().await?)
        } else {
            let message = response.text().await.unwrap_or_default();
            Err(RefsyncError::Api { status, message })
        }
    }

    /// Resolve an identifier and return the first metadata record.
    ///
    /// The server responds with a JSON array of candidate records; the sync
    /// pipeline only ever wants the first one. An empty array is `NotFound`.
    pub async fn resolve_item(
        &self,
        identifier: &str,
        strategy: Strategy,
    ) -> Result<serde_json::Value> {
        let body = self.resolve_raw(identifier, strategy).await?;
        let parsed: serde_json::Value = serde_json::from_str(&body)
            .map_err(|e| RefsyncError::Parse(format!("invalid translation response: {}", e)))?;

        parsed
            .as_array()
            .and_then(|records| records.first())
            .cloned()
            .ok_or_else(|| RefsyncError::NotFound(format!("no metadata for {}", identifier)))
    }

    /// The explicit two-step fallback chain of the batch pipeline: try the
    /// `page` strategy first; on failure wait `delay`, then try `search`.
    pub async fn resolve_with_fallback(&self, identifier: &str, delay: Duration) -> Resolution {
        match self.resolve_raw(identifier, Strategy::Page).await {
            Ok(metadata) => Resolution::Resolved {
                via: Strategy::Page,
                metadata,
            },
            Err(e) => {
                debug!("page strategy failed for {}: {}", identifier, e);
                tokio::time::sleep(delay).await;
                match self.resolve_raw(identifier, Strategy::Search).await {
                    Ok(metadata) => Resolution::Resolved {
                        via: Strategy::Search,
                        metadata,
                    },
                    Err(e) => {
                        debug!("search strategy failed for {}: {}", identifier, e);
                        Resolution::Unresolved
                    }
                }
            }
        }
    }

    /// Export previously resolved metadata into the given citation format
    /// (`bibtex`, `ris`, `csljson`, ...). Returns the formatted text.
    pub async fn export(&self, metadata: &str, format: &str) -> Result<String> {
        let url = format!("{}/export", self.base_url);
        let response = self
            .http
            .post(&url)
            .query(&[("format", format)])
            .header("Content-Type", "application/json")
            .body(metadata.to_string())
            .send()
            .await?;

        let status = response.status().as_u16();
        if (200..300).contains(&status) {
            Ok(response.text().await?)
        } else {
            let message = response.text().await.unwrap_or_default();
            Err(RefsyncError::Api { status, message })
        }
    }
}
