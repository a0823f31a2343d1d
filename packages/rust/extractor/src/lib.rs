//! Location extraction from fishing-spot pages.
//!
//! This crate provides:
//! - [`table`]: the data-table extractor
//! - [`classify`]: pure field classification over a row's cells
//! - [`script`]: fallback scanner for coordinates embedded in scripts
//! - [`ExtractorRegistry`]: picks the extractor for a parsed document

pub mod classify;
pub mod script;
pub mod table;

use reefpoints_shared::{LocationRecord, RegionBounds};
use scraper::Html;
use tracing::{debug, info};

pub use classify::{RowCell, RowRejection, classify_row, classify_structure, parse_depth_ft};
pub use script::{PLACEHOLDER_NAME, ScriptExtractor};
pub use table::TableExtractor;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Inputs an extractor needs besides the document.
#[derive(Debug, Clone, Copy)]
pub struct ExtractContext<'a> {
    /// Source page identifier (URL), recorded on script-scanned records.
    pub source: Option<&'a str>,
    /// Regional bounds used to tell latitude cells from longitude cells.
    pub bounds: &'a RegionBounds,
}

/// Which extraction path produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractMethod {
    Table,
    Script,
}

impl std::fmt::Display for ExtractMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Table => f.write_str("table"),
            Self::Script => f.write_str("script"),
        }
    }
}

/// Records pulled from one document, with row statistics.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub method: ExtractMethod,
    pub records: Vec<LocationRecord>,
    /// Candidate rows (at least four cells) examined. Zero for script scans.
    pub rows_seen: usize,
    /// Candidate rows that produced no record.
    pub rows_rejected: usize,
}

impl Extraction {
    pub fn empty(method: ExtractMethod) -> Self {
        Self {
            method,
            records: Vec::new(),
            rows_seen: 0,
            rows_rejected: 0,
        }
    }
}

/// A strategy for pulling location records out of a parsed page.
///
/// Extractors are tried in priority order; [`ScriptExtractor`] is the
/// always-last fallback.
pub trait LocationExtractor: Send + Sync {
    /// Whether this extractor should handle the document.
    fn detect(&self, doc: &Html) -> bool;

    /// Extract every valid record from the document.
    fn extract(&self, doc: &Html, ctx: &ExtractContext<'_>) -> Extraction;

    /// Short name for tracing.
    fn name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Holds extractors in priority order.
pub struct ExtractorRegistry {
    extractors: Vec<Box<dyn LocationExtractor>>,
}

impl ExtractorRegistry {
    /// Table extractor first, script scanner last.
    pub fn new() -> Self {
        Self {
            extractors: vec![Box::new(TableExtractor), Box::new(ScriptExtractor)],
        }
    }

    /// The first extractor that claims the document.
    pub fn detect(&self, doc: &Html) -> &dyn LocationExtractor {
        self.extractors
            .iter()
            .find(|extractor| extractor.detect(doc))
            .map(|extractor| extractor.as_ref())
            .unwrap_or(&ScriptExtractor)
    }

    /// Detect the right extractor and run it.
    pub fn extract(&self, doc: &Html, ctx: &ExtractContext<'_>) -> Extraction {
        let extractor = self.detect(doc);
        if extractor.name() != "table" {
            info!(source = ctx.source.unwrap_or("-"), "no data table found, scanning scripts");
        }

        let extraction = extractor.extract(doc, ctx);
        debug!(
            extractor = extractor.name(),
            records = extraction.records.len(),
            rows_seen = extraction.rows_seen,
            rows_rejected = extraction.rows_rejected,
            "document extracted"
        );
        extraction
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse raw HTML and extract its records with the default registry.
pub fn extract_html(html: &str, ctx: &ExtractContext<'_>) -> Extraction {
    let doc = Html::parse_document(html);
    ExtractorRegistry::new().extract(&doc, ctx)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "https://www.tidespro.com/fishing/us/north-carolina/outer-banks";

    fn ctx(bounds: &RegionBounds) -> ExtractContext<'_> {
        ExtractContext {
            source: Some(SOURCE),
            bounds,
        }
    }

    // -----------------------------------------------------------------------
    // Detection
    // -----------------------------------------------------------------------

    #[test]
    fn detect_table() {
        let doc = Html::parse_document("<table class='table-sm'><tr><td>x</td></tr></table>");
        assert_eq!(ExtractorRegistry::new().detect(&doc).name(), "table");
    }

    #[test]
    fn detect_script_fallback() {
        let doc = Html::parse_document("<html><body><div>no table</div></body></html>");
        assert_eq!(ExtractorRegistry::new().detect(&doc).name(), "script");
    }

    // -----------------------------------------------------------------------
    // End to end
    // -----------------------------------------------------------------------

    #[test]
    fn script_only_page_yields_minimal_record() {
        let html = r#"<html><body>
            <div id="map"></div>
            <script>var spot = {"lat": 35.1, "lng": -75.9};</script>
        </body></html>"#;
        let bounds = RegionBounds::default();
        let extraction = extract_html(html, &ctx(&bounds));

        assert_eq!(extraction.method, ExtractMethod::Script);
        assert_eq!(extraction.records.len(), 1);
        let record = &extraction.records[0];
        assert_eq!(record.name, "Fishing Location");
        assert_eq!(record.source.as_deref(), Some(SOURCE));
        assert!(record.structure_type.is_none());
        assert!(record.depth.is_none());
    }

    #[test]
    fn table_with_no_valid_rows_does_not_fall_back() {
        let html = r#"<html><body>
            <table class="table"><tbody>
              <tr><td>AR-1</td><td>Pipe</td><td>n/a</td><td>n/a</td></tr>
            </tbody></table>
            <script>var spot = {"lat": 35.1, "lng": -75.9};</script>
        </body></html>"#;
        let bounds = RegionBounds::default();
        let extraction = extract_html(html, &ctx(&bounds));

        assert_eq!(extraction.method, ExtractMethod::Table);
        assert!(extraction.records.is_empty());
        assert_eq!(extraction.rows_rejected, 1);
    }

    #[test]
    fn empty_document_yields_nothing() {
        let bounds = RegionBounds::default();
        let extraction = extract_html("", &ctx(&bounds));
        assert_eq!(extraction.method, ExtractMethod::Script);
        assert!(extraction.records.is_empty());
    }
}
