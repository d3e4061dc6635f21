//! The batch resolution pipeline.
//!
//! Takes an ordered list of raw identifiers, resolves each through the
//! page→search fallback chain, exports the metadata into the requested
//! citation format, and writes results to the output in input order.
//! Processing is strictly sequential with a fixed inter-item delay as a
//! crude rate limiter.

use crate::error::Result;
use crate::input::InputItem;
use crate::translator::{Resolution, TranslatorClient};
use std::io::Write;
use std::time::Duration;
use tracing::{debug, warn};

/// Options for one batch run.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Citation format passed to the export endpoint.
    pub format: String,
    /// Suppress passthrough of unresolved identifiers.
    pub hide_failures: bool,
    /// Inter-request delay, also used between the page and search attempts.
    pub delay: Duration,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            format: "bibtex".to_string(),
            hide_failures: false,
            delay: Duration::from_secs(1),
        }
    }
}

/// Per-run outcome counters.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub resolved: usize,
    pub unresolved: usize,
}

/// Resolve and format every item, writing results to `out` in input order.
///
/// Unresolved items are reported on the diagnostic stream and, unless
/// suppressed, passed through to the output verbatim so they can be retried
/// by hand. An export failure aborts the whole run: items already written
/// stay written, the rest are never attempted.
pub async fn run<W: Write>(
    translator: &TranslatorClient,
    items: &[InputItem],
    options: &BatchOptions,
    out: &mut W,
) -> Result<BatchReport> {
    let mut report = BatchReport::default();

    for item in items {
        tokio::time::sleep(options.delay).await;

        match translator.resolve_with_fallback(&item.raw, options.delay).await {
            Resolution::Resolved { via, metadata } => {
                let formatted = translator.export(&metadata, &options.format).await?;
                writeln!(out, "{}", formatted)?;
                debug!("resolved {} via {} strategy", item.raw, via);
                report.resolved += 1;
            }
            Resolution::Unresolved => {
                warn!(
                    "translation server could not get metadata for {} (from {})",
                    item.raw, item.origin
                );
                if !options.hide_failures {
                    writeln!(out, "{}", item.raw)?;
                }
                report.unresolved += 1;
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RefsyncError;
    use crate::input::Origin;
    use mockito::{Matcher, Server};

    fn item(raw: &str) -> InputItem {
        InputItem {
            raw: raw.to_string(),
            origin: Origin::Argument,
        }
    }

    fn options() -> BatchOptions {
        BatchOptions {
            delay: Duration::ZERO,
            ..Default::default()
        }
    }

    /// A resolves via page, B fails both strategies, C resolves via search;
    /// output must be formatted(A), "B", formatted(C) in that order.
    #[tokio::test]
    async fn test_output_preserves_input_order_with_passthrough() {
        let mut server = Server::new_async().await;

        let _web_a = server
            .mock("POST", "/web")
            .match_body("http://a")
            .with_status(200)
            .with_body(r#"[{"title": "A"}]"#)
            .create_async()
            .await;
        let _web_b = server
            .mock("POST", "/web")
            .match_body("B")
            .with_status(500)
            .create_async()
            .await;
        let _web_c = server
            .mock("POST", "/web")
            .match_body("10.1000/c")
            .with_status(500)
            .create_async()
            .await;
        let _search_b = server
            .mock("POST", "/search")
            .match_body("B")
            .with_status(500)
            .create_async()
            .await;
        let _search_c = server
            .mock("POST", "/search")
            .match_body("10.1000/c")
            .with_status(200)
            .with_body(r#"[{"title": "C"}]"#)
            .create_async()
            .await;
        let _export = server
            .mock("POST", "/export")
            .match_query(Matcher::UrlEncoded("format".into(), "bibtex".into()))
            .match_body(Matcher::Regex("\"A\"".to_string()))
            .with_status(200)
            .with_body("@misc{a}")
            .create_async()
            .await;
        let _export_c = server
            .mock("POST", "/export")
            .match_query(Matcher::UrlEncoded("format".into(), "bibtex".into()))
            .match_body(Matcher::Regex("\"C\"".to_string()))
            .with_status(200)
            .with_body("@misc{c}")
            .create_async()
            .await;

        let translator = TranslatorClient::new(server.url());
        let items = vec![item("http://a"), item("B"), item("10.1000/c")];
        let mut out = Vec::new();

        let report = run(&translator, &items, &options(), &mut out)
            .await
            .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "@misc{a}\nB\n@misc{c}\n");
        assert_eq!(
            report,
            BatchReport {
                resolved: 2,
                unresolved: 1
            }
        );
    }

    #[tokio::test]
    async fn test_hide_failures_suppresses_passthrough() {
        let mut server = Server::new_async().await;
        let _web = server
            .mock("POST", "/web")
            .with_status(500)
            .create_async()
            .await;
        let _search = server
            .mock("POST", "/search")
            .with_status(500)
            .create_async()
            .await;

        let translator = TranslatorClient::new(server.url());
        let opts = BatchOptions {
            hide_failures: true,
            delay: Duration::ZERO,
            ..Default::default()
        };
        let mut out = Vec::new();

        let report = run(&translator, &[item("nope")], &opts, &mut out)
            .await
            .unwrap();

        assert!(out.is_empty());
        assert_eq!(report.unresolved, 1);
    }

    #[tokio::test]
    async fn test_export_failure_aborts_run() {
        let mut server = Server::new_async().await;
        let _web = server
            .mock("POST", "/web")
            .with_status(200)
            .with_body(r#"[{"title": "A"}]"#)
            .expect(1)
            .create_async()
            .await;
        let _export = server
            .mock("POST", "/export")
            .match_query(Matcher::Any)
            .with_status(400)
            .with_body("bad metadata")
            .create_async()
            .await;

        let translator = TranslatorClient::new(server.url());
        let items = vec![item("http://a"), item("http://never-reached")];
        let mut out = Vec::new();

        // One bad export stops the whole run; the second item is never tried.
        let err = run(&translator, &items, &options(), &mut out)
            .await
            .unwrap_err();
        assert!(matches!(err, RefsyncError::Api { status: 400, .. }));
    }

    #[tokio::test]
    async fn test_custom_format_reaches_export() {
        let mut server = Server::new_async().await;
        let _web = server
            .mock("POST", "/web")
            .with_status(200)
            .with_body(r#"[{"title": "A"}]"#)
            .create_async()
            .await;
        let export = server
            .mock("POST", "/export")
            .match_query(Matcher::UrlEncoded("format".into(), "ris".into()))
            .with_status(200)
            .with_body("TY  - GEN")
            .create_async()
            .await;

        let translator = TranslatorClient::new(server.url());
        let opts = BatchOptions {
            format: "ris".to_string(),
            delay: Duration::ZERO,
            ..Default::default()
        };
        let mut out = Vec::new();
        run(&translator, &[item("http://a")], &opts, &mut out)
            .await
            .unwrap();

        export.assert_async().await;
        assert_eq!(String::from_utf8(out).unwrap(), "TY  - GEN\n");
    }
}
