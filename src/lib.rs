//! # refsync
//!
//! Sync Readwise highlights into a Zotero library, and resolve batches of
//! URLs/identifiers into citation records, using a Zotero translation server
//! for metadata extraction.
//!
//! Provides:
//! - **Library**: async clients for Readwise, the Zotero web API, and a
//!   translation server, plus the two pipelines that tie them together
//! - **CLI**: `refsync` binary with `sync` and `cite` subcommands
//!
//! ## Quick Start
//!
//! ```no_run
//! # async fn example() -> refsync::error::Result<()> {
//! use refsync::{ReadwiseClient, TranslatorClient, ZoteroClient};
//!
//! let readwise = ReadwiseClient::new("readwise-token");
//! let zotero = ZoteroClient::new("zotero-api-key", "1234567");
//! let translator = TranslatorClient::new("http://127.0.0.1:1969");
//!
//! let report = refsync::sync::run(&readwise, &zotero, &translator).await;
//! println!("{} new items", report.count(refsync::sync::SyncOutcome::Inserted));
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod config;
pub mod dedup;
pub mod error;
pub mod input;
pub mod readwise;
pub mod sync;
pub mod translator;
pub mod zotero;

// Re-export key types at the crate root.
pub use batch::{BatchOptions, BatchReport};
pub use config::Settings;
pub use dedup::DedupIndex;
pub use error::{RefsyncError, Result};
pub use input::{InputItem, Origin};
pub use readwise::{Highlight, ReadwiseClient};
pub use translator::{Resolution, Strategy, TranslatorClient};
pub use zotero::{LibraryItem, ZoteroClient};

/// Build the HTTP client shared by all API clients. No explicit timeout is
/// configured; the tool is a one-shot batch run and relies on reqwest's
/// defaults.
pub(crate) fn build_http(verify_ssl: bool) -> reqwest::Client {
    reqwest::Client::builder()
        .danger_accept_invalid_certs(!verify_ssl)
        .build()
        .expect("Failed to create HTTP client")
}
