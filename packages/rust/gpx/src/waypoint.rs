//! Display rules for a single waypoint.
//!
//! Devices show only a short identifier, so the record name is split at its
//! first whitespace: the head becomes the waypoint name and the tail moves
//! into the description. The display symbol is derived from that tail alone
//! and may disagree with the record's stored `sym`.

/// Symbol written to the `<sym>` element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaypointSymbol {
    Shipwreck,
    Fish,
}

impl WaypointSymbol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Shipwreck => "Shipwreck",
            Self::Fish => "Fish",
        }
    }
}

/// `<type>` value for records without a structure type.
pub const DEFAULT_WAYPOINT_TYPE: &str = "Fishing";

/// Split a full name into its display head and the remainder.
///
/// The remainder is `None` when the name has no whitespace or nothing follows it.
pub fn split_display_name(name: &str) -> (&str, Option<&str>) {
    match name.split_once(char::is_whitespace) {
        Some((head, rest)) => {
            let rest = rest.trim();
            (head, (!rest.is_empty()).then_some(rest))
        }
        None => (name, None),
    }
}

/// `Shipwreck` if the name remainder mentions a wreck, `Fish` otherwise.
pub fn display_symbol(remainder: Option<&str>) -> WaypointSymbol {
    match remainder {
        Some(rest) if rest.to_lowercase().contains("wreck") => WaypointSymbol::Shipwreck,
        _ => WaypointSymbol::Fish,
    }
}

/// Name remainder and free-text description, joined by a line break.
pub fn waypoint_description(remainder: Option<&str>, description: Option<&str>) -> Option<String> {
    let parts: Vec<&str> = [remainder, description]
        .into_iter()
        .flatten()
        .filter(|p| !p.trim().is_empty())
        .collect();

    (!parts.is_empty()).then(|| parts.join("\n"))
}
