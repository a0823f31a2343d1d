//! Fallback extractor for pages without a data table.
//!
//! Map widgets often embed their markers as JS/JSON in `<script>` blocks.
//! Every coordinate pair found there becomes a minimal record.

use std::sync::LazyLock;

use regex::Regex;
use reefpoints_shared::LocationRecord;
use scraper::{Html, Selector};
use tracing::debug;

use super::{ExtractContext, ExtractMethod, Extraction, LocationExtractor};

/// Name given to records found in scripts.
pub const PLACEHOLDER_NAME: &str = "Fishing Location";

/// Provenance used when the page URL is unknown.
const UNKNOWN_SOURCE: &str = "script";

static SCRIPT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("script").expect("valid selector"));

/// Coordinate-pair patterns, applied in order. All matches of all patterns are
/// kept; overlapping hits are removed later by coordinate dedup.
static COORD_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r#""lat":\s*(-?\d+\.?\d*),?\s*"lng?":\s*(-?\d+\.?\d*)"#,
        r#""latitude":\s*(-?\d+\.?\d*),?\s*"longitude":\s*(-?\d+\.?\d*)"#,
        r#"lat:\s*(-?\d+\.?\d*),?\s*lng?:\s*(-?\d+\.?\d*)"#,
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

/// Scans embedded scripts for coordinate pairs. Always matches, so it is the
/// last extractor in the registry.
pub struct ScriptExtractor;

impl LocationExtractor for ScriptExtractor {
    fn detect(&self, _doc: &Html) -> bool {
        true
    }

    fn extract(&self, doc: &Html, ctx: &ExtractContext<'_>) -> Extraction {
        let source = ctx.source.unwrap_or(UNKNOWN_SOURCE);
        let mut extraction = Extraction::empty(ExtractMethod::Script);

        for script in doc.select(&SCRIPT) {
            let text = script.text().collect::<String>();
            if text.trim().is_empty() {
                continue;
            }
            extraction.records.extend(scan_script(&text, source));
        }

        debug!(records = extraction.records.len(), "script scan complete");
        extraction
    }

    fn name(&self) -> &str {
        "script"
    }
}

/// Find every coordinate pair in one script body.
///
/// Pairs outside [-90, 90] / [-180, 180] are dropped.
pub fn scan_script(script: &str, source: &str) -> Vec<LocationRecord> {
    let mut records = Vec::new();

    for pattern in COORD_PATTERNS.iter() {
        for caps in pattern.captures_iter(script) {
            let (Ok(lat), Ok(lon)) = (caps[1].parse::<f64>(), caps[2].parse::<f64>()) else {
                continue;
            };
            match LocationRecord::new(PLACEHOLDER_NAME, lat, lon) {
                Ok(record) => records.push(record.with_source(source)),
                Err(e) => debug!(lat, lon, error = %e, "script coordinate rejected"),
            }
        }
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use reefpoints_shared::RegionBounds;

    #[test]
    fn quoted_lat_lng_pair() {
        let records = scan_script(r#"var m = {"lat": 35.1, "lng": -75.9};"#, "page");
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.name, PLACEHOLDER_NAME);
        assert_eq!(r.latitude(), 35.1);
        assert_eq!(r.longitude(), -75.9);
        assert_eq!(r.source.as_deref(), Some("page"));
        assert!(r.structure_type.is_none());
        assert!(r.sym.is_none());
        assert!(r.depth.is_none());
        assert!(r.description.is_none());
    }

    #[test]
    fn all_patterns_collect_all_matches() {
        let script = r#"
            markers.push({"lat": 34.1, "lng": -77.1});
            markers.push({"latitude": 34.2, "longitude": -77.2});
            L.marker({lat: 34.3, lng: -77.3});
            L.marker({lat:34.4,lng:-77.4});
        "#;
        let records = scan_script(script, "page");
        let coords: Vec<(f64, f64)> = records
            .iter()
            .map(|r| (r.latitude(), r.longitude()))
            .collect();
        assert_eq!(
            coords,
            vec![(34.1, -77.1), (34.2, -77.2), (34.3, -77.3), (34.4, -77.4)]
        );
    }

    #[test]
    fn out_of_range_pairs_dropped() {
        let records = scan_script(r#"{"lat": 95.0, "lng": -75.9} {"lat": 35.0, "lng": -190}"#, "p");
        assert!(records.is_empty());
    }

    #[test]
    fn extractor_scans_every_script_block() {
        let doc = Html::parse_document(
            r#"<html><head>
                <script>var a = {"lat": 35.1, "lng": -75.9};</script>
                <script src="/app.js"></script>
              </head><body>
                <script>init({lat: 34.9, lng: -76.2});</script>
              </body></html>"#,
        );
        let bounds = RegionBounds::default();
        let ctx = ExtractContext {
            source: None,
            bounds: &bounds,
        };

        let extraction = ScriptExtractor.extract(&doc, &ctx);
        assert_eq!(extraction.method, ExtractMethod::Script);
        assert_eq!(extraction.records.len(), 2);
        assert_eq!(extraction.records[0].source.as_deref(), Some("script"));
        assert_eq!(extraction.records[1].latitude(), 34.9);
    }
}
