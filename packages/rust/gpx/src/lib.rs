//! GPX 1.1 output with Garmin waypoint extensions.
//!
//! [`render_gpx`] builds the document in memory; [`write_gpx`] writes it to
//! disk through a temporary file so a failed run never leaves a truncated
//! `.gpx` behind.

pub mod waypoint;

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use reefpoints_shared::{LocationRecord, OutputConfig, ReefPointsError, Result};
use sha2::{Digest, Sha256};
use tracing::{debug, error, info, instrument};

pub use waypoint::{
    DEFAULT_WAYPOINT_TYPE, WaypointSymbol, display_symbol, split_display_name,
    waypoint_description,
};

pub const GPX_NAMESPACE: &str = "http://www.topografix.com/GPX/1/1";
pub const GARMIN_NAMESPACE: &str = "http://www.garmin.com/xmlschemas/GpxExtensions/v3";
const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";
const GPX_SCHEMA: &str = "http://www.topografix.com/GPX/1/1/gpx.xsd";

// ---------------------------------------------------------------------------
// Options / summary
// ---------------------------------------------------------------------------

/// Document-level values for the GPX header and metadata block.
#[derive(Debug, Clone)]
pub struct GpxOptions {
    /// `<metadata><name>`.
    pub title: String,
    /// Root `creator` attribute.
    pub creator: String,
    /// Site named in the metadata description.
    pub data_source: String,
    /// Generation time, written as `<metadata><time>` and the description date.
    pub generated_at: DateTime<Utc>,
}

impl From<&OutputConfig> for GpxOptions {
    fn from(config: &OutputConfig) -> Self {
        Self {
            title: config.title.clone(),
            creator: config.creator.clone(),
            data_source: config.data_source.clone(),
            generated_at: Utc::now(),
        }
    }
}

/// What [`write_gpx`] produced.
#[derive(Debug, Clone)]
pub struct GpxSummary {
    pub path: PathBuf,
    pub waypoints: usize,
    pub bytes: usize,
    pub sha256: String,
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Render records as an indented GPX document.
pub fn render_gpx(records: &[LocationRecord], opts: &GpxOptions) -> Result<String> {
    render(records, opts).map(|(document, _)| document)
}

fn render(records: &[LocationRecord], opts: &GpxOptions) -> Result<(String, usize)> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    emit(
        &mut writer,
        Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)),
    )?;

    let schema_location =
        format!("{GPX_NAMESPACE} {GPX_SCHEMA} {GARMIN_NAMESPACE} {GARMIN_NAMESPACE}");
    let mut root = BytesStart::new("gpx");
    root.push_attribute(("version", "1.1"));
    root.push_attribute(("creator", xml_text(&opts.creator).as_ref()));
    root.push_attribute(("xmlns", GPX_NAMESPACE));
    root.push_attribute(("xmlns:gpxx", GARMIN_NAMESPACE));
    root.push_attribute(("xmlns:xsi", XSI_NAMESPACE));
    root.push_attribute(("xsi:schemaLocation", schema_location.as_str()));
    emit(&mut writer, Event::Start(root))?;

    write_metadata(&mut writer, opts)?;

    let mut waypoints = 0;
    for record in records {
        let (lat, lon) = (record.latitude(), record.longitude());
        if !lat.is_finite() || !lon.is_finite() {
            debug!(name = %record.name, "skipping record without usable coordinates");
            continue;
        }
        write_waypoint(&mut writer, record)?;
        waypoints += 1;
    }

    emit(&mut writer, Event::End(BytesEnd::new("gpx")))?;

    let document = String::from_utf8(writer.into_inner())
        .map_err(|e| ReefPointsError::Serialization(format!("GPX output is not UTF-8: {e}")))?;
    Ok((document, waypoints))
}

fn write_metadata(writer: &mut Writer<Vec<u8>>, opts: &GpxOptions) -> Result<()> {
    let desc = format!(
        "Fishing locations scraped from {} on {}",
        opts.data_source,
        opts.generated_at.format("%Y-%m-%d")
    );
    let time = opts.generated_at.to_rfc3339_opts(SecondsFormat::Secs, true);

    emit(writer, Event::Start(BytesStart::new("metadata")))?;
    text_element(writer, "name", &opts.title)?;
    text_element(writer, "desc", &desc)?;
    text_element(writer, "time", &time)?;
    emit(writer, Event::End(BytesEnd::new("metadata")))
}

fn write_waypoint(writer: &mut Writer<Vec<u8>>, record: &LocationRecord) -> Result<()> {
    let (display_name, remainder) = split_display_name(&record.name);
    let lat = record.latitude().to_string();
    let lon = record.longitude().to_string();

    let mut wpt = BytesStart::new("wpt");
    wpt.push_attribute(("lat", lat.as_str()));
    wpt.push_attribute(("lon", lon.as_str()));
    emit(writer, Event::Start(wpt))?;

    text_element(writer, "name", display_name)?;
    if let Some(desc) = waypoint_description(remainder, record.description.as_deref()) {
        text_element(writer, "desc", &desc)?;
    }
    text_element(writer, "sym", display_symbol(remainder).as_str())?;
    let waypoint_type = record
        .structure_type
        .map_or(DEFAULT_WAYPOINT_TYPE, |t| t.as_str());
    text_element(writer, "type", waypoint_type)?;

    if record.structure_type.is_some() || record.depth.is_some() || record.temperature.is_some() {
        write_extensions(writer, record)?;
    }

    emit(writer, Event::End(BytesEnd::new("wpt")))
}

fn write_extensions(writer: &mut Writer<Vec<u8>>, record: &LocationRecord) -> Result<()> {
    emit(writer, Event::Start(BytesStart::new("extensions")))?;
    emit(writer, Event::Start(BytesStart::new("gpxx:WaypointExtension")))?;

    if let Some(structure_type) = record.structure_type {
        emit(writer, Event::Start(BytesStart::new("gpxx:Categories")))?;
        text_element(writer, "gpxx:Category", structure_type.as_str())?;
        emit(writer, Event::End(BytesEnd::new("gpxx:Categories")))?;
    }
    if let Some(depth) = record.depth {
        text_element(writer, "gpxx:Depth", &depth.to_string())?;
    }
    if let Some(temperature) = record.temperature {
        text_element(writer, "gpxx:Temperature", &temperature.to_string())?;
    }

    emit(writer, Event::End(BytesEnd::new("gpxx:WaypointExtension")))?;
    emit(writer, Event::End(BytesEnd::new("extensions")))
}

fn text_element(writer: &mut Writer<Vec<u8>>, name: &str, text: &str) -> Result<()> {
    let text = xml_text(text);
    emit(writer, Event::Start(BytesStart::new(name)))?;
    emit(writer, Event::Text(BytesText::new(&text)))?;
    emit(writer, Event::End(BytesEnd::new(name)))
}

/// Drop characters XML 1.0 does not allow (C0 controls other than tab, LF
/// and CR, plus U+FFFE/U+FFFF).
fn xml_text(text: &str) -> Cow<'_, str> {
    let illegal = |c: char| {
        matches!(c, '\u{0}'..='\u{8}' | '\u{B}' | '\u{C}' | '\u{E}'..='\u{1F}' | '\u{FFFE}' | '\u{FFFF}')
    };
    if text.contains(illegal) {
        Cow::Owned(text.chars().filter(|&c| !illegal(c)).collect())
    } else {
        Cow::Borrowed(text)
    }
}

fn emit(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| ReefPointsError::Serialization(format!("GPX write failed: {e}")))
}

// ---------------------------------------------------------------------------
// File output
// ---------------------------------------------------------------------------

/// Render and write a GPX file.
///
/// The document goes to a hidden temp file beside `path` and is renamed into
/// place once fully written.
#[instrument(skip_all, fields(path = %path.display(), records = records.len()))]
pub fn write_gpx(records: &[LocationRecord], path: &Path, opts: &GpxOptions) -> Result<GpxSummary> {
    let (document, waypoints) = render(records, opts)?;

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| ReefPointsError::validation(format!("invalid output path {path:?}")))?;
    let temp = path.with_file_name(format!(".{file_name}.tmp"));

    if let Err(e) = std::fs::write(&temp, &document) {
        let _ = std::fs::remove_file(&temp);
        return Err(ReefPointsError::io(&temp, e));
    }
    if let Err(e) = std::fs::rename(&temp, path) {
        let _ = std::fs::remove_file(&temp);
        return Err(ReefPointsError::io(path, e));
    }

    let mut hasher = Sha256::new();
    hasher.update(document.as_bytes());
    let sha256 = format!("{:x}", hasher.finalize());

    info!(waypoints, bytes = document.len(), "GPX file written");

    Ok(GpxSummary {
        path: path.to_path_buf(),
        waypoints,
        bytes: document.len(),
        sha256,
    })
}

/// Boolean form of [`write_gpx`]: `true` on success, failures are logged.
pub fn create_gpx_file(records: &[LocationRecord], path: &Path, opts: &GpxOptions) -> bool {
    match write_gpx(records, path, opts) {
        Ok(_) => true,
        Err(e) => {
            error!(path = %path.display(), error = %e, "failed to create GPX file");
            false
        }
    }
}
