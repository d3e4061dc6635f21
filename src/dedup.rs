//! Duplicate detection over the fetched Zotero library.

use crate::zotero::LibraryItem;
use std::collections::HashSet;

/// Membership index of the source URLs already present in the library.
///
/// Matching is exact string equality: two URLs differing only by a trailing
/// slash, scheme, or query string are distinct. That limitation is contained
/// here so a normalizing comparison could replace it without touching the
/// pipeline.
#[derive(Debug, Default)]
pub struct DedupIndex {
    urls: HashSet<String>,
}

impl DedupIndex {
    /// Build the index from a library listing, keyed by each item's
    /// `data.url` field. Items without a URL are ignored.
    pub fn from_items(items: &[LibraryItem]) -> Self {
        let urls = items
            .iter()
            .filter_map(|item| item.url())
            .map(String::from)
            .collect();
        Self { urls }
    }

    /// Whether an item with exactly this URL already exists.
    pub fn contains(&self, url: &str) -> bool {
        self.urls.contains(url)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}
