//! End-to-end scrape: sources -> fetch -> extract -> aggregate -> dedup.

use std::time::{Duration, Instant};

use chrono::Utc;
use reefpoints_extractor::{ExtractContext, ExtractMethod, extract_html};
use reefpoints_fetcher::Fetcher;
use reefpoints_shared::{LocationRecord, PipelineConfig, RegionBounds, RunId};
use tracing::{info, instrument, warn};

use crate::aggregate::Aggregator;

/// Outcome of one source.
#[derive(Debug, Clone)]
pub struct SourceReport {
    pub url: String,
    /// Extraction path used; `None` when the page could not be fetched.
    pub method: Option<ExtractMethod>,
    pub records: usize,
    pub rows_seen: usize,
    pub rows_rejected: usize,
    /// Fetch error, if the source was skipped.
    pub error: Option<String>,
}

/// Result of a scrape or offline extraction run.
#[derive(Debug)]
pub struct ScrapeResult {
    pub run_id: RunId,
    /// Deduplicated records in source-then-row order.
    pub records: Vec<LocationRecord>,
    /// One report per source, in declaration order.
    pub sources: Vec<SourceReport>,
    /// Records found before dedup.
    pub total_found: usize,
    pub elapsed: Duration,
}

impl ScrapeResult {
    pub fn duplicates_removed(&self) -> usize {
        self.total_found - self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn source_urls(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.url.clone()).collect()
    }
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when a source is about to be fetched or parsed.
    fn source_started(&self, url: &str, current: usize, total: usize);
    /// Called once a source has been handled.
    fn source_done(&self, report: &SourceReport);
    /// Called when the run completes.
    fn done(&self, result: &ScrapeResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn source_started(&self, _url: &str, _current: usize, _total: usize) {}
    fn source_done(&self, _report: &SourceReport) {}
    fn done(&self, _result: &ScrapeResult) {}
}

/// Fetch every configured source in order and build the deduplicated list.
///
/// A source that fails to fetch is logged and contributes nothing.
#[instrument(skip_all, fields(sources = config.sources.len()))]
pub async fn scrape(
    config: &PipelineConfig,
    fetcher: &Fetcher,
    progress: &dyn ProgressReporter,
) -> ScrapeResult {
    let start = Instant::now();
    let mut run = Run::new(&config.bounds);
    let total = config.sources.len();

    info!(run_id = %run.run_id, total, "starting scrape");

    for (i, url) in config.sources.iter().enumerate() {
        progress.source_started(url.as_str(), i + 1, total);

        let report = match fetcher.fetch_page(url).await {
            Ok(html) => run.add_document(url.as_str(), &html),
            Err(e) => {
                warn!(url = %url, error = %e, "skipping source");
                SourceReport {
                    url: url.to_string(),
                    method: None,
                    records: 0,
                    rows_seen: 0,
                    rows_rejected: 0,
                    error: Some(e.to_string()),
                }
            }
        };

        progress.source_done(&report);
        run.reports.push(report);
    }

    let result = run.finish(start.elapsed());
    progress.done(&result);
    result
}

/// Run extraction over already-fetched `(source_url, html)` documents, in order.
#[instrument(skip_all, fields(documents = documents.len()))]
pub fn extract_documents(
    documents: &[(String, String)],
    bounds: &RegionBounds,
    progress: &dyn ProgressReporter,
) -> ScrapeResult {
    let start = Instant::now();
    let mut run = Run::new(bounds);
    let total = documents.len();

    for (i, (source, html)) in documents.iter().enumerate() {
        progress.source_started(source, i + 1, total);
        let report = run.add_document(source, html);
        progress.source_done(&report);
        run.reports.push(report);
    }

    let result = run.finish(start.elapsed());
    progress.done(&result);
    result
}

// ---------------------------------------------------------------------------
// Run state
// ---------------------------------------------------------------------------

struct Run<'a> {
    run_id: RunId,
    bounds: &'a RegionBounds,
    aggregator: Aggregator,
    reports: Vec<SourceReport>,
}

impl<'a> Run<'a> {
    fn new(bounds: &'a RegionBounds) -> Self {
        Self {
            run_id: RunId::new(),
            bounds,
            aggregator: Aggregator::new(),
            reports: Vec::new(),
        }
    }

    fn add_document(&mut self, source: &str, html: &str) -> SourceReport {
        let ctx = ExtractContext {
            source: Some(source),
            bounds: self.bounds,
        };
        let extraction = extract_html(html, &ctx);
        let records = extraction.records.len();

        info!(
            url = source,
            method = %extraction.method,
            records,
            rows_rejected = extraction.rows_rejected,
            "source extracted"
        );

        self.aggregator
            .push_source(source, extraction.records, Utc::now());

        SourceReport {
            url: source.to_string(),
            method: Some(extraction.method),
            records,
            rows_seen: extraction.rows_seen,
            rows_rejected: extraction.rows_rejected,
            error: None,
        }
    }

    fn finish(self, elapsed: Duration) -> ScrapeResult {
        let total_found = self.aggregator.len();
        let records = self.aggregator.finish();

        info!(
            run_id = %self.run_id,
            total_found,
            unique = records.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "run complete"
        );

        ScrapeResult {
            run_id: self.run_id,
            records,
            sources: self.reports,
            total_found,
            elapsed,
        }
    }
}
