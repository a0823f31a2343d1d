//! Field classification for one table row.
//!
//! Columns on the source pages are not in a fixed order, so cells are
//! classified by content: decimal-degree spans are sorted into latitude and
//! longitude by range, and depth is found by a number followed by a unit.
//! Everything here works on [`RowCell`] values and never touches the DOM.

use std::sync::LazyLock;

use regex::Regex;
use reefpoints_shared::{LocationRecord, RegionBounds, StructureType};

/// Minimum cells for a usable row: name, description and two coordinates.
pub const MIN_ROW_CELLS: usize = 4;

/// Feet per meter.
const FEET_PER_METER: f64 = 3.28084;

/// Feet per fathom.
const FEET_PER_FATHOM: f64 = 6.0;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Text content of one table cell, as seen by the classifier.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowCell {
    /// Whitespace-collapsed text of the whole cell.
    pub text: String,
    /// Text of the cell's decimal-degree span, if it has one.
    pub decimal_degrees: Option<String>,
}

impl RowCell {
    /// A plain text cell.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            decimal_degrees: None,
        }
    }

    /// A coordinate cell carrying a decimal-degree span.
    pub fn coordinate(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            text: value.clone(),
            decimal_degrees: Some(value),
        }
    }
}

/// Why a row produced no record.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RowRejection {
    #[error("row has {0} cells, need at least {MIN_ROW_CELLS}")]
    TooFewCells(usize),

    #[error("name cell is empty")]
    EmptyName,

    #[error("no latitude cell found")]
    MissingLatitude,

    #[error("no longitude cell found")]
    MissingLongitude,

    #[error("invalid record: {0}")]
    Invalid(String),
}

// ---------------------------------------------------------------------------
// Row classification
// ---------------------------------------------------------------------------

/// Classify a row's cells into a [`LocationRecord`].
///
/// Cell 0 is the name and cell 1 the description. Coordinates may sit in any
/// cell; the first decimal-degree value inside the latitude bounds is the
/// latitude and the first inside the longitude bounds is the longitude.
/// Depth is read from the first non-coordinate cell at index 2 or later that
/// holds a number with a length unit.
pub fn classify_row(
    cells: &[RowCell],
    bounds: &RegionBounds,
) -> Result<LocationRecord, RowRejection> {
    if cells.len() < MIN_ROW_CELLS {
        return Err(RowRejection::TooFewCells(cells.len()));
    }

    let name = collapse_whitespace(&cells[0].text);
    if name.is_empty() {
        return Err(RowRejection::EmptyName);
    }

    let description = clean_description(&cells[1].text);

    let mut latitude: Option<f64> = None;
    let mut longitude: Option<f64> = None;
    let mut depth: Option<f64> = None;

    for (i, cell) in cells.iter().enumerate() {
        if let Some(raw) = &cell.decimal_degrees {
            let Ok(value) = raw.trim().parse::<f64>() else {
                tracing::debug!(%name, cell = i, value = %raw, "unparseable decimal-degree span");
                continue;
            };
            if bounds.contains_latitude(value) {
                latitude.get_or_insert(value);
            } else if bounds.contains_longitude(value) {
                longitude.get_or_insert(value);
            }
        } else if i >= 2 && depth.is_none() {
            depth = parse_depth_ft(&cell.text);
        }
    }

    let latitude = latitude.ok_or(RowRejection::MissingLatitude)?;
    let longitude = longitude.ok_or(RowRejection::MissingLongitude)?;

    let structure_type = classify_structure(&name, &description);

    let record = LocationRecord::new(name, latitude, longitude)
        .map_err(|e| RowRejection::Invalid(e.to_string()))?
        .with_description(description)
        .with_depth(depth)
        .with_classification(structure_type);

    Ok(record)
}

/// Decide the stored structure type from name and description.
///
/// "wreck" wins over "concrete"; anything else is an artificial reef.
pub fn classify_structure(name: &str, description: &str) -> StructureType {
    let combined = format!("{name} {description}").to_lowercase();
    if combined.contains("wreck") {
        StructureType::Shipwreck
    } else if combined.contains("concrete") {
        StructureType::ConcreteReef
    } else {
        StructureType::ArtificialReef
    }
}

// ---------------------------------------------------------------------------
// Text helpers
// ---------------------------------------------------------------------------

/// Collapse runs of whitespace to single spaces and trim the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strip trailing boilerplate (depth notes, deployment dates, tide links,
/// footnotes, update stamps) from a description.
///
/// Everything from the first marker to the end of the text is removed.
pub fn clean_description(text: &str) -> String {
    static NOISE_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"Average Depth:|Deployed:|Depth:|Tides & Solunars|\[1\]|Last Updated:")
            .expect("valid regex")
    });

    let collapsed = collapse_whitespace(text);
    match NOISE_RE.find(&collapsed) {
        Some(m) => collapsed[..m.start()].trim().to_string(),
        None => collapsed,
    }
}

/// Find the first `<number> <unit>` depth in `text` and convert it to feet.
///
/// Units: feet/ft, fathoms/fath/f, meters/meter/m (case-insensitive).
pub fn parse_depth_ft(text: &str) -> Option<f64> {
    static DEPTH_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?i)([0-9]+(?:\.[0-9]+)?)\s*(ft|feet|fathoms|fath|f|m|meters?)\b")
            .expect("valid regex")
    });

    let caps = DEPTH_RE.captures(text)?;
    let value: f64 = caps[1].parse().ok()?;

    let feet = match caps[2].to_lowercase().as_str() {
        "m" | "meter" | "meters" => value * FEET_PER_METER,
        "fathoms" | "fath" | "f" => value * FEET_PER_FATHOM,
        _ => value,
    };
    Some(feet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reefpoints_shared::Symbol;

    fn bounds() -> RegionBounds {
        RegionBounds::default()
    }

    fn row(name: &str, desc: &str, rest: Vec<RowCell>) -> Vec<RowCell> {
        let mut cells = vec![RowCell::text(name), RowCell::text(desc)];
        cells.extend(rest);
        cells
    }

    // -----------------------------------------------------------------------
    // Depth
    // -----------------------------------------------------------------------

    #[test]
    fn depth_meters_to_feet() {
        let ft = parse_depth_ft("10 meters").unwrap();
        assert!((ft - 32.8084).abs() < 1e-4);

        let ft = parse_depth_ft("10m").unwrap();
        assert!((ft - 32.8084).abs() < 1e-4);
    }

    #[test]
    fn depth_fathoms_to_feet() {
        assert_eq!(parse_depth_ft("5 fathoms"), Some(30.0));
        assert_eq!(parse_depth_ft("5 fath"), Some(30.0));
        assert_eq!(parse_depth_ft("5 F"), Some(30.0));
    }

    #[test]
    fn depth_feet_unchanged() {
        assert_eq!(parse_depth_ft("40 ft"), Some(40.0));
        assert_eq!(parse_depth_ft("Depth: 84 FEET"), Some(84.0));
        assert_eq!(parse_depth_ft("62.5ft"), Some(62.5));
    }

    #[test]
    fn depth_requires_unit_on_word_boundary() {
        assert_eq!(parse_depth_ft("2005"), None);
        assert_eq!(parse_depth_ft("12 fish"), None);
        assert_eq!(parse_depth_ft("30 miles"), None);
    }

    // -----------------------------------------------------------------------
    // Description cleanup
    // -----------------------------------------------------------------------

    #[test]
    fn description_strips_boilerplate_to_end() {
        assert_eq!(
            clean_description("Tug and barge. Average Depth: 60 ft Deployed: 1998"),
            "Tug and barge."
        );
        assert_eq!(
            clean_description("Concrete pipe Tides & Solunars for this spot"),
            "Concrete pipe"
        );
        assert_eq!(clean_description("Rubble [1] see notes"), "Rubble");
        assert_eq!(
            clean_description("Bridge span Last Updated: 2021-03-02"),
            "Bridge span"
        );
    }

    #[test]
    fn description_strip_spans_lines() {
        let text = "Sunken barge\nDepth: 45 ft\nMore lines\nhere";
        assert_eq!(clean_description(text), "Sunken barge");
    }

    #[test]
    fn description_markers_are_case_sensitive() {
        assert_eq!(clean_description("depth: shallow ledge"), "depth: shallow ledge");
    }

    // -----------------------------------------------------------------------
    // Structure type
    // -----------------------------------------------------------------------

    #[test]
    fn wreck_precedes_concrete() {
        assert_eq!(
            classify_structure("AR-315", "Concrete wreck structure"),
            StructureType::Shipwreck
        );
    }

    #[test]
    fn concrete_and_default_types() {
        assert_eq!(
            classify_structure("AR-320", "Concrete culverts"),
            StructureType::ConcreteReef
        );
        assert_eq!(
            classify_structure("AR-325", "Reef balls"),
            StructureType::ArtificialReef
        );
        // The name counts too.
        assert_eq!(
            classify_structure("Indra WRECK", ""),
            StructureType::Shipwreck
        );
    }

    // -----------------------------------------------------------------------
    // Row classification
    // -----------------------------------------------------------------------

    #[test]
    fn classifies_standard_row() {
        let cells = row(
            "  AAR-465   Garry Ennis Reef - Site 1 ",
            "Reef balls and pipe. Average Depth: 60 ft",
            vec![
                RowCell::coordinate("34.567890"),
                RowCell::coordinate("-77.123456"),
                RowCell::text("60 ft"),
            ],
        );

        let record = classify_row(&cells, &bounds()).unwrap();
        assert_eq!(record.name, "AAR-465 Garry Ennis Reef - Site 1");
        assert_eq!(record.description.as_deref(), Some("Reef balls and pipe."));
        assert_eq!(record.latitude(), 34.567890);
        assert_eq!(record.longitude(), -77.123456);
        assert_eq!(record.depth, Some(60.0));
        assert_eq!(record.structure_type, Some(StructureType::ArtificialReef));
        assert_eq!(record.sym, Some(Symbol::Reef));
        assert!(record.source_url.is_none());
    }

    #[test]
    fn coordinate_columns_found_in_any_order() {
        let cells = row(
            "Wreck of the Tarpon",
            "",
            vec![
                RowCell::text("14 fathoms"),
                RowCell::coordinate("-76.6"),
                RowCell::text("note"),
                RowCell::coordinate("34.3"),
            ],
        );

        let record = classify_row(&cells, &bounds()).unwrap();
        assert_eq!(record.latitude(), 34.3);
        assert_eq!(record.longitude(), -76.6);
        assert_eq!(record.depth, Some(84.0));
        assert!(record.description.is_none());
        assert_eq!(record.structure_type, Some(StructureType::Shipwreck));
        assert_eq!(record.sym, Some(Symbol::Wreck));
    }

    #[test]
    fn first_match_of_each_class_wins() {
        let cells = row(
            "AR-340",
            "Pipe",
            vec![
                RowCell::coordinate("34.1"),
                RowCell::coordinate("-77.1"),
                RowCell::coordinate("35.9"),
                RowCell::coordinate("-76.9"),
            ],
        );

        let record = classify_row(&cells, &bounds()).unwrap();
        assert_eq!(record.latitude(), 34.1);
        assert_eq!(record.longitude(), -77.1);
    }

    #[test]
    fn first_depth_wins_and_skips_name_and_description() {
        let cells = row(
            "AR-345 40 ft ledge",
            "Ledge in 50 ft",
            vec![
                RowCell::coordinate("34.1"),
                RowCell::coordinate("-77.1"),
                RowCell::text("10 m"),
                RowCell::text("70 ft"),
            ],
        );

        let record = classify_row(&cells, &bounds()).unwrap();
        let depth = record.depth.unwrap();
        assert!((depth - 32.8084).abs() < 1e-4);
    }

    #[test]
    fn rejects_missing_longitude() {
        let cells = row(
            "AR-350",
            "Pipe",
            vec![RowCell::coordinate("34.1"), RowCell::text("n/a")],
        );
        assert_eq!(
            classify_row(&cells, &bounds()),
            Err(RowRejection::MissingLongitude)
        );
    }

    #[test]
    fn rejects_out_of_region_coordinates() {
        // Pacific coordinates fall outside both regional bounds.
        let cells = row(
            "AR-355",
            "Pipe",
            vec![RowCell::coordinate("21.3"), RowCell::coordinate("-157.8")],
        );
        assert_eq!(
            classify_row(&cells, &bounds()),
            Err(RowRejection::MissingLatitude)
        );
    }

    #[test]
    fn unparseable_span_does_not_count_as_coordinate() {
        let cells = row(
            "AR-360",
            "Pipe",
            vec![RowCell::coordinate("34°30'N"), RowCell::coordinate("-77.2")],
        );
        assert_eq!(
            classify_row(&cells, &bounds()),
            Err(RowRejection::MissingLatitude)
        );
    }

    #[test]
    fn rejects_empty_name_and_short_rows() {
        let cells = row(
            "   ",
            "Pipe",
            vec![RowCell::coordinate("34.1"), RowCell::coordinate("-77.1")],
        );
        assert_eq!(classify_row(&cells, &bounds()), Err(RowRejection::EmptyName));

        let short = vec![RowCell::text("AR-1"), RowCell::coordinate("34.1")];
        assert_eq!(
            classify_row(&short, &bounds()),
            Err(RowRejection::TooFewCells(2))
        );
    }

    #[test]
    fn alternate_bounds_change_classification() {
        let gulf = RegionBounds {
            lat_min: 24.0,
            lat_max: 31.0,
            lon_min: -98.0,
            lon_max: -80.0,
        };
        let cells = row(
            "Vandenberg",
            "Wreck",
            vec![RowCell::coordinate("24.45"), RowCell::coordinate("-81.73")],
        );

        assert!(classify_row(&cells, &gulf).is_ok());
        assert_eq!(
            classify_row(&cells, &bounds()),
            Err(RowRejection::MissingLatitude)
        );
    }
}
