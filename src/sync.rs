//! The highlight-to-library sync pipeline.
//!
//! Fetches Readwise highlights, extracts the distinct source URLs, and for
//! each URL not already in the Zotero library resolves it through the
//! translation server and inserts the result. Every URL is processed
//! independently: a failure affects only that candidate, and iteration order
//! over the candidate set is unspecified.

use crate::dedup::DedupIndex;
use crate::readwise::{Highlight, ReadwiseClient};
use crate::translator::{Strategy, TranslatorClient};
use crate::zotero::ZoteroClient;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{info, warn};

/// Terminal state of one candidate URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SyncOutcome {
    /// Resolved and added to the library.
    Inserted,
    /// Already present in the library.
    Skipped,
    /// The translation server produced no metadata.
    ResolveFailed,
    /// The library rejected the insert.
    InsertFailed,
}

impl std::fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncOutcome::Inserted => write!(f, "inserted"),
            SyncOutcome::Skipped => write!(f, "already exists"),
            SyncOutcome::ResolveFailed => write!(f, "resolve failed"),
            SyncOutcome::InsertFailed => write!(f, "insert failed"),
        }
    }
}

/// What happened to one candidate URL.
#[derive(Debug, Clone, Serialize)]
pub struct SyncRecord {
    pub url: String,
    pub outcome: SyncOutcome,
    /// Title from the resolved metadata, when resolution got that far.
    pub title: Option<String>,
}

/// Per-run summary, one record per candidate URL.
#[derive(Debug, Default, Serialize)]
pub struct SyncReport {
    pub records: Vec<SyncRecord>,
}

impl SyncReport {
    pub fn count(&self, outcome: SyncOutcome) -> usize {
        self.records.iter().filter(|r| r.outcome == outcome).count()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Extract the candidate URL set from fetched highlights: the distinct,
/// non-empty `source_url` values.
pub fn extract_candidate_urls(highlights: &[Highlight]) -> HashSet<String> {
    highlights
        .iter()
        .filter_map(|h| h.source_url.as_deref())
        .filter(|url| !url.is_empty())
        .map(String::from)
        .collect()
}

/// Run one sync pass. Never fails as a whole: per-candidate errors are
/// logged and recorded, and an empty highlight fetch simply yields an empty
/// report.
pub async fn run(
    readwise: &ReadwiseClient,
    zotero: &ZoteroClient,
    translator: &TranslatorClient,
) -> SyncReport {
    let highlights = readwise.fetch_all().await;
    let candidates = extract_candidate_urls(&highlights);
    if candidates.is_empty() {
        info!("no source URLs found in Readwise highlights");
        return SyncReport::default();
    }
    info!("{} candidate URLs from {} highlights", candidates.len(), highlights.len());

    let items = zotero.list_all().await;
    let index = DedupIndex::from_items(&items);
    info!("{} URLs already in the Zotero library", index.len());

    let mut report = SyncReport::default();
    for url in candidates {
        let record = process_candidate(zotero, translator, &index, url).await;
        report.records.push(record);
    }
    report
}

async fn process_candidate(
    zotero: &ZoteroClient,
    translator: &TranslatorClient,
    index: &DedupIndex,
    url: String,
) -> SyncRecord {
    if index.contains(&url) {
        info!("item with URL {} already exists in Zotero", url);
        return SyncRecord {
            url,
            outcome: SyncOutcome::Skipped,
            title: None,
        };
    }

    info!("fetching metadata for URL: {}", url);
    let metadata = match translator.resolve_item(&url, Strategy::Page).await {
        Ok(serde_json::Value::Object(map)) => map,
        Ok(other) => {
            warn!("unexpected metadata shape for {}: {}", url, other);
            return SyncRecord {
                url,
                outcome: SyncOutcome::ResolveFailed,
                title: None,
            };
        }
        Err(e) => {
            warn!("could not retrieve metadata for URL {}: {}", url, e);
            return SyncRecord {
                url,
                outcome: SyncOutcome::ResolveFailed,
                title: None,
            };
        }
    };

    // Every inserted item must carry the candidate URL, even when the
    // translator omitted or altered the url field.
    let mut metadata = metadata;
    metadata.insert("url".to_string(), serde_json::Value::String(url.clone()));
    let title = metadata
        .get("title")
        .and_then(|t| t.as_str())
        .map(String::from);

    match zotero.insert(&serde_json::Value::Object(metadata)).await {
        Ok(()) => {
            info!(
                "added item to Zotero: {}",
                title.as_deref().unwrap_or("No Title")
            );
            SyncRecord {
                url,
                outcome: SyncOutcome::Inserted,
                title,
            }
        }
        Err(e) => {
            warn!("error adding item to Zotero: {}", e);
            SyncRecord {
                url,
                outcome: SyncOutcome::InsertFailed,
                title,
            }
        }
    }
}
