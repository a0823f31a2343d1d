//! Merging per-source records, provenance and coordinate dedup.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use reefpoints_shared::LocationRecord;
use tracing::debug;
use url::Url;

/// Country attached to every record from a `/fishing/us/...` source.
pub const COUNTRY: &str = "United States";

// ---------------------------------------------------------------------------
// Source path
// ---------------------------------------------------------------------------

/// State and region named by a source URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourcePlace {
    pub state: Option<String>,
    pub region: Option<String>,
}

/// Read `state` and `region` from a `.../fishing/us/{state}/{region}` path.
///
/// Anything else yields an empty place.
pub fn parse_source_place(source_url: &str) -> SourcePlace {
    let path = match Url::parse(source_url) {
        Ok(url) => url.path().to_string(),
        Err(_) => source_url.to_string(),
    };
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    let Some(start) = segments
        .windows(2)
        .position(|w| w[0] == "fishing" && w[1] == "us")
    else {
        return SourcePlace::default();
    };

    let mut rest = segments[start + 2..].iter();
    SourcePlace {
        state: rest.next().map(|s| slug_to_title(s)),
        region: rest.next().map(|s| slug_to_title(s)),
    }
}

/// `north-carolina` -> `North Carolina`.
pub fn slug_to_title(slug: &str) -> String {
    slug.split('-')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Fill a fresh record's provenance fields.
///
/// `region` is only set on records without a structure type.
pub fn attach_provenance(
    record: &mut LocationRecord,
    source_url: &str,
    place: &SourcePlace,
    scraped_at: DateTime<Utc>,
) {
    record.source_url = Some(source_url.to_string());
    record.scraped_at = Some(scraped_at);
    if let Some(state) = &place.state {
        record.state = Some(state.clone());
        record.country = Some(COUNTRY.to_string());
    }
    if record.structure_type.is_none() {
        record.region = place.region.clone();
    }
}

// ---------------------------------------------------------------------------
// Aggregator
// ---------------------------------------------------------------------------

/// Accumulates records in source order.
#[derive(Debug, Default)]
pub struct Aggregator {
    records: Vec<LocationRecord>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one source's records, stamping provenance. Returns how many were added.
    pub fn push_source(
        &mut self,
        source_url: &str,
        records: Vec<LocationRecord>,
        scraped_at: DateTime<Utc>,
    ) -> usize {
        let place = parse_source_place(source_url);
        let count = records.len();

        self.records.extend(records.into_iter().map(|mut record| {
            attach_provenance(&mut record, source_url, &place, scraped_at);
            record
        }));

        debug!(source = source_url, count, "records aggregated");
        count
    }

    /// Records collected so far, before dedup.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Deduplicate and hand back the records in processing order.
    pub fn finish(self) -> Vec<LocationRecord> {
        dedupe(self.records)
    }
}

// ---------------------------------------------------------------------------
// Dedup
// ---------------------------------------------------------------------------

/// Coordinates rounded to 6 decimal places, as decimal text.
///
/// Rounding is applied to the exact stored value, so a coordinate that sits
/// just under a half-step keeps rounding down.
pub fn coordinate_key(record: &LocationRecord) -> (String, String) {
    (key_part(record.latitude()), key_part(record.longitude()))
}

fn key_part(value: f64) -> String {
    let text = format!("{value:.6}");
    match text.strip_prefix('-') {
        Some(magnitude) if magnitude.bytes().all(|b| b == b'0' || b == b'.') => {
            magnitude.to_string()
        }
        _ => text,
    }
}

/// Keep the first record for each coordinate key, preserving order.
pub fn dedupe(records: Vec<LocationRecord>) -> Vec<LocationRecord> {
    let before = records.len();
    let mut seen = HashSet::with_capacity(before);
    let unique: Vec<LocationRecord> = records
        .into_iter()
        .filter(|record| seen.insert(coordinate_key(record)))
        .collect();

    debug!(before, after = unique.len(), "deduplicated by coordinate");
    unique
}
