//! Zotero web API client (the remote library).
//!
//! Listing is read-only and feeds the deduplication index; insertion wraps a
//! single resolved item in the one-element batch the API expects.

use crate::build_http;
use crate::error::{RefsyncError, Result};
use serde::Deserialize;
use tracing::warn;

/// Production Zotero API base URL.
pub const ZOTERO_API_URL: &str = "https://api.zotero.org";

/// Offset-based pagination page size.
const PAGE_LIMIT: usize = 100;

/// An item in the Zotero library. The bibliographic fields live in the
/// schemaless `data` mapping; the sync pipeline only ever reads `data.url`.
#[derive(Debug, Clone, Deserialize)]
pub struct LibraryItem {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub data: serde_json::Map<String, serde_json::Value>,
}

impl LibraryItem {
    /// The item's source URL, if it has one.
    pub fn url(&self) -> Option<&str> {
        self.data.get("url").and_then(|v| v.as_str())
    }
}

/// Client for a single user's Zotero library.
#[derive(Clone)]
pub struct ZoteroClient {
    http: reqwest::Client,
    api_key: String,
    user_id: String,
    base_url: String,
}

impl ZoteroClient {
    /// Create a new client for the given user's library.
    pub fn new(api_key: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            http: build_http(true),
            api_key: api_key.into(),
            user_id: user_id.into(),
            base_url: ZOTERO_API_URL.to_string(),
        }
    }

    /// Override the base URL (useful for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Enable or disable TLS certificate verification.
    pub fn with_ssl_verification(mut self, verify: bool) -> Self {
        self.http = build_http(verify);
        self
    }

    fn items_url(&self) -> String {
        format!("{}/users/{}/items", self.base_url, self.user_id)
    }

    /// List the user's library items with offset pagination, stopping at the
    /// first empty page.
    ///
    /// Best-effort failure policy: an error mid-pagination keeps whatever was
    /// accumulated so far. Duplicate detection degrades rather than aborting
    /// the run, the opposite of the highlight fetch.
    pub async fn list_all(&self) -> Vec<LibraryItem> {
        let mut items = Vec::new();
        let mut start = 0usize;

        loop {
            let response = match self
                .http
                .get(self.items_url())
                .header("Authorization", format!("Bearer {}", self.api_key))
                .header("Zotero-API-Version", "3")
                .query(&[("start", start.to_string()), ("limit", PAGE_LIMIT.to_string())])
                .send()
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    warn!("failed to fetch Zotero items: {}", e);
                    break;
                }
            };

            if !response.status().is_success() {
                warn!(
                    "failed to fetch Zotero items: HTTP {}",
                    response.status().as_u16()
                );
                break;
            }

            let batch: Vec<LibraryItem> = match response.json().await {
                Ok(b) => b,
                Err(e) => {
                    warn!("invalid Zotero items response: {}", e);
                    break;
                }
            };

            if batch.is_empty() {
                break;
            }
            items.extend(batch);
            start += PAGE_LIMIT;
        }

        items
    }

    /// Insert one resolved item, wrapped in a single-element batch.
    ///
    /// The API reports success as HTTP 200 or 201; anything else becomes an
    /// [`RefsyncError::Api`] for the caller to log and move past.
    pub async fn insert(&self, item: &serde_json::Value) -> Result<()> {
        let response = self
            .http
            .post(self.items_url())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Zotero-API-Version", "3")
            .json(&serde_json::json!([item]))
            .send()
            .await?;

        match response.status().as_u16() {
            200 | 201 => Ok(()),
            status => {
                let message = response.text().await.unwrap_or_default();
                Err(RefsyncError::Api { status, message })
            }
        }
    }
}
