//! Core domain types for reefpoints location data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ReefPointsError, Result};

// ---------------------------------------------------------------------------
// RunId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper identifying one scrape run (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Generate a new time-sortable run identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RunId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Structure type of a fishing location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StructureType {
    #[serde(rename = "Shipwreck")]
    Shipwreck,
    #[serde(rename = "Concrete Reef")]
    ConcreteReef,
    #[serde(rename = "Artificial Reef")]
    ArtificialReef,
}

impl StructureType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Shipwreck => "Shipwreck",
            Self::ConcreteReef => "Concrete Reef",
            Self::ArtificialReef => "Artificial Reef",
        }
    }

    /// Symbol stored alongside this type at extraction time.
    pub fn symbol(&self) -> Symbol {
        match self {
            Self::Shipwreck => Symbol::Wreck,
            Self::ConcreteReef | Self::ArtificialReef => Symbol::Reef,
        }
    }
}

impl std::fmt::Display for StructureType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display-symbol tag recorded at extraction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Symbol {
    Wreck,
    Reef,
}

impl Symbol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wreck => "Wreck",
            Self::Reef => "Reef",
        }
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// LocationRecord
// ---------------------------------------------------------------------------

/// A single marine-structure location, normalized from one table row or
/// script match.
///
/// Coordinates are private and only set through [`LocationRecord::new`], so a
/// record with an empty name or out-of-range coordinates cannot be built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationRecord {
    /// Full name as shown on the source page.
    pub name: String,
    /// Free-text description with boilerplate stripped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    latitude: f64,
    longitude: f64,
    /// Depth in feet.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depth: Option<f64>,
    /// Water temperature, when a source provides one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub structure_type: Option<StructureType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sym: Option<Symbol>,
    /// Where a script-scanned record came from (page URL or `"script"`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    // Provenance, attached by the aggregator.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scraped_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

impl LocationRecord {
    /// Build a record from a name and a decimal-degree coordinate pair.
    ///
    /// Fails if the name is blank, latitude is outside [-90, 90] or longitude
    /// is outside [-180, 180].
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ReefPointsError::validation("location name is empty"));
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(ReefPointsError::validation(format!(
                "latitude {latitude} out of range"
            )));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(ReefPointsError::validation(format!(
                "longitude {longitude} out of range"
            )));
        }

        Ok(Self {
            name,
            description: None,
            latitude,
            longitude,
            depth: None,
            temperature: None,
            structure_type: None,
            sym: None,
            source: None,
            source_url: None,
            scraped_at: None,
            state: None,
            country: None,
            region: None,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Set the description, dropping it if blank.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        let description = description.into();
        self.description = (!description.trim().is_empty()).then_some(description);
        self
    }

    pub fn with_depth(mut self, depth_ft: Option<f64>) -> Self {
        self.depth = depth_ft;
        self
    }

    /// Set both the structure type and its stored symbol.
    pub fn with_classification(mut self, structure_type: StructureType) -> Self {
        self.structure_type = Some(structure_type);
        self.sym = Some(structure_type.symbol());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_id_roundtrip() {
        let id = RunId::new();
        let s = id.to_string();
        let parsed: RunId = s.parse().expect("parse RunId");
        assert_eq!(id, parsed);
    }

    #[test]
    fn record_rejects_out_of_range_coordinates() {
        assert!(LocationRecord::new("Reef", 90.5, -77.0).is_err());
        assert!(LocationRecord::new("Reef", -90.5, -77.0).is_err());
        assert!(LocationRecord::new("Reef", 34.0, 180.1).is_err());
        assert!(LocationRecord::new("Reef", 34.0, -180.1).is_err());
        assert!(LocationRecord::new("Reef", f64::NAN, -77.0).is_err());
        assert!(LocationRecord::new("Reef", 90.0, -180.0).is_ok());
    }

    #[test]
    fn record_rejects_blank_name() {
        let err = LocationRecord::new("   ", 34.0, -77.0).unwrap_err();
        assert!(err.to_string().contains("name is empty"));
    }

    #[test]
    fn classification_sets_type_and_symbol() {
        let record = LocationRecord::new("AR-330", 34.0, -77.0)
            .unwrap()
            .with_classification(StructureType::Shipwreck);
        assert_eq!(record.structure_type, Some(StructureType::Shipwreck));
        assert_eq!(record.sym, Some(Symbol::Wreck));

        let record = record.with_classification(StructureType::ConcreteReef);
        assert_eq!(record.sym, Some(Symbol::Reef));
    }

    #[test]
    fn blank_description_is_dropped() {
        let record = LocationRecord::new("AR-330", 34.0, -77.0)
            .unwrap()
            .with_description("  ");
        assert!(record.description.is_none());
    }

    #[test]
    fn record_serializes_with_type_key() {
        let record = LocationRecord::new("AR-330 Tug", 34.25, -77.5)
            .unwrap()
            .with_description("Sunken tug")
            .with_depth(Some(60.0))
            .with_classification(StructureType::ArtificialReef);

        let json = serde_json::to_value(&record).expect("serialize");
        assert_eq!(json["type"], "Artificial Reef");
        assert_eq!(json["sym"], "Reef");
        assert_eq!(json["latitude"], 34.25);
        assert_eq!(json["longitude"], -77.5);
        assert!(json.get("region").is_none());
        assert!(json.get("temperature").is_none());
    }
}
