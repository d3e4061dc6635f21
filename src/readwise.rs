//! Readwise highlights API client (the remote item source).

use crate::build_http;
use serde::Deserialize;
use tracing::warn;

/// Production Readwise API base URL.
pub const READWISE_API_URL: &str = "https://readwise.io/api/v2";

/// A captured highlight. Only the fields the sync pipeline reads are
/// deserialized; the interesting one is `source_url`.
#[derive(Debug, Clone, Deserialize)]
pub struct Highlight {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub source_url: Option<String>,
}

/// One page of the highlights listing: results plus a cursor to the next
/// page, absent on the last one.
#[derive(Debug, Deserialize)]
struct HighlightPage {
    #[serde(default)]
    results: Vec<Highlight>,
    #[serde(default)]
    next: Option<String>,
}

/// Client for the Readwise highlights API.
#[derive(Clone)]
pub struct ReadwiseClient {
    http: reqwest::Client,
    token: String,
    base_url: String,
}

impl ReadwiseClient {
    /// Create a new client with the given access token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            http: build_http(true),
            token: token.into(),
            base_url: READWISE_API_URL.to_string(),
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

    /// Fetch every highlight, following cursor pagination until the server
    /// stops supplying a `next` URL.
    ///
    /// Conservative failure policy: any transport error or non-success
    /// response mid-pagination discards partial results and yields an empty
    /// list, so the sync pipeline does nothing rather than acting on
    /// incomplete data.
    pub async fn fetch_all(&self) -> Vec<Highlight> {
        let mut highlights = Vec::new();
        let mut next_url = Some(format!("{}/highlights/", self.base_url));

        while let Some(url) = next_url {
            let response = match self
                .http
                .get(&url)
                .header("Authorization", format!("Token {}", self.token))
                .send()
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    warn!("failed to fetch Readwise highlights: {}", e);
                    return Vec::new();
                }
            };

            if !response.status().is_success() {
                warn!(
                    "failed to fetch Readwise highlights: HTTP {}",
                    response.status().as_u16()
                );
                return Vec::new();
            }

            let page: HighlightPage = match response.json().await {
                Ok(p) => p,
                Err(e) => {
                    warn!("invalid Readwise highlights response: {}", e);
                    return Vec::new();
                }
            };

            highlights.extend(page.results);
            next_url = page.next;
        }

        highlights
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    #[tokio::test]
    async fn test_fetch_all_follows_cursor() {
        let mut server = Server::new_async().await;

        let page2_url = format!("{}/highlights/page2", server.url());
        let _page1 = server
            .mock("GET", "/highlights/")
            .match_header("authorization", "Token tok")
            .with_status(200)
            .with_body(format!(
                r#"{{"results": [{{"id": 1, "source_url": "http://a"}}], "next": "{}"}}"#,
                page2_url
            ))
            .create_async()
            .await;
        let _page2 = server
            .mock("GET", "/highlights/page2")
            .with_status(200)
            .with_body(r#"{"results": [{"id": 2, "source_url": "http://b"}, {"id": 3}], "next": null}"#)
            .create_async()
            .await;

        let client = ReadwiseClient::new("tok").with_base_url(server.url());
        let highlights = client.fetch_all().await;

        assert_eq!(highlights.len(), 3);
        assert_eq!(highlights[0].source_url.as_deref(), Some("http://a"));
        assert!(highlights[2].source_url.is_none());
    }

    #[tokio::test]
    async fn test_fetch_all_discards_partials_on_failure() {
        let mut server = Server::new_async().await;

        let page2_url = format!("{}/highlights/page2", server.url());
        let _page1 = server
            .mock("GET", "/highlights/")
            .with_status(200)
            .with_body(format!(
                r#"{{"results": [{{"id": 1, "source_url": "http://a"}}], "next": "{}"}}"#,
                page2_url
            ))
            .create_async()
            .await;
        let _page2 = server
            .mock("GET", "/highlights/page2")
            .with_status(500)
            .with_body("server error")
            .create_async()
            .await;

        let client = ReadwiseClient::new("tok").with_base_url(server.url());
        let highlights = client.fetch_all().await;

        // The first page succeeded, but a mid-pagination failure must not
        // surface partial results.
        assert!(highlights.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_all_empty_on_auth_failure() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/highlights/")
            .with_status(401)
            .create_async()
            .await;

        let client = ReadwiseClient::new("bad").with_base_url(server.url());
        assert!(client.fetch_all().await.is_empty());
    }
}
