//! Output file naming and the raw JSON dump.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, Utc};
use reefpoints_gpx::{GpxOptions, GpxSummary, write_gpx};
use reefpoints_shared::{LocationRecord, ReefPointsError, Result, RunId};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::pipeline::ScrapeResult;

/// Timestamped GPX and JSON paths for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub gpx: PathBuf,
    pub json: PathBuf,
}

impl OutputPaths {
    /// `{prefix}_points_{stamp}.gpx` and `{prefix}_data_{stamp}.json` under `dir`,
    /// with `stamp` formatted `YYYYmmdd_HHMMSS`. Creates `dir` if needed.
    pub fn timestamped(dir: &Path, prefix: &str, now: NaiveDateTime) -> Result<Self> {
        std::fs::create_dir_all(dir).map_err(|e| ReefPointsError::io(dir, e))?;

        let stamp = now.format("%Y%m%d_%H%M%S");
        Ok(Self {
            gpx: dir.join(format!("{prefix}_points_{stamp}.gpx")),
            json: dir.join(format!("{prefix}_data_{stamp}.json")),
        })
    }
}

/// Shape of the raw JSON dump.
#[derive(Debug, Serialize)]
pub struct RawDump<'a> {
    pub run_id: &'a RunId,
    pub generated_at: DateTime<Utc>,
    pub sources: &'a [String],
    pub count: usize,
    pub records: &'a [LocationRecord],
}

/// Write the deduplicated records as pretty JSON, via a temp file.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn write_raw_json(path: &Path, dump: &RawDump<'_>) -> Result<()> {
    let json = serde_json::to_string_pretty(dump)
        .map_err(|e| ReefPointsError::Serialization(format!("JSON serialization failed: {e}")))?;

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| ReefPointsError::validation(format!("invalid output path {path:?}")))?;
    let temp = path.with_file_name(format!(".{file_name}.tmp"));

    if let Err(e) = std::fs::write(&temp, &json) {
        let _ = std::fs::remove_file(&temp);
        return Err(ReefPointsError::io(&temp, e));
    }
    std::fs::rename(&temp, path).map_err(|e| {
        let _ = std::fs::remove_file(&temp);
        ReefPointsError::io(path, e)
    })?;

    debug!(bytes = json.len(), records = dump.count, "wrote JSON file");
    Ok(())
}

/// Files written for one run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub gpx: GpxSummary,
    /// Raw JSON dump, when enabled.
    pub json: Option<PathBuf>,
}

/// Write a run's GPX file and, if `write_json` is set, its raw JSON dump.
///
/// The JSON dump is only written once the GPX file is in place.
#[instrument(skip_all, fields(path = %paths.gpx.display(), records = result.records.len()))]
pub fn write_run(
    result: &ScrapeResult,
    paths: &OutputPaths,
    opts: &GpxOptions,
    write_json: bool,
) -> Result<RunOutput> {
    let gpx = write_gpx(&result.records, &paths.gpx, opts)?;

    let json = if write_json {
        let sources = result.source_urls();
        let dump = RawDump {
            run_id: &result.run_id,
            generated_at: opts.generated_at,
            sources: &sources,
            count: result.records.len(),
            records: &result.records,
        };
        write_raw_json(&paths.json, &dump)?;
        Some(paths.json.clone())
    } else {
        None
    };

    info!(run_id = %result.run_id, waypoints = gpx.waypoints, "run output written");
    Ok(RunOutput { gpx, json })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use reefpoints_shared::{RegionBounds, StructureType};

    use crate::pipeline::{SilentProgress, extract_documents};

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("reefpoints-output-{}", uuid::Uuid::now_v7()))
    }

    fn stamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 16)
            .unwrap()
            .and_hms_opt(9, 5, 7)
            .unwrap()
    }

    #[test]
    fn timestamped_names_and_creates_dir() {
        let tmp = temp_dir();
        let dir = tmp.join("point_files");

        let paths = OutputPaths::timestamped(&dir, "nc_fishing", stamp()).unwrap();

        assert!(dir.is_dir());
        assert_eq!(paths.gpx, dir.join("nc_fishing_points_20261016_090507.gpx"));
        assert_eq!(paths.json, dir.join("nc_fishing_data_20261016_090507.json"));

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn raw_json_dump() {
        let tmp = temp_dir();
        std::fs::create_dir_all(&tmp).unwrap();
        let path = tmp.join("data.json");

        let records = vec![
            LocationRecord::new("AR-370 Liberty Ship Wreck", 34.4, -76.9)
                .unwrap()
                .with_depth(Some(72.0))
                .with_classification(StructureType::Shipwreck),
        ];
        let run_id = RunId::new();
        let sources = vec!["https://www.tidespro.com/fishing/us/north-carolina/long-bay".to_string()];
        let dump = RawDump {
            run_id: &run_id,
            generated_at: Utc::now(),
            sources: &sources,
            count: records.len(),
            records: &records,
        };

        write_raw_json(&path, &dump).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["run_id"], run_id.to_string());
        assert_eq!(value["count"], 1);
        let record = &value["records"][0];
        assert_eq!(record["type"], "Shipwreck");
        assert_eq!(record["sym"], "Wreck");
        assert_eq!(record["latitude"], 34.4);
        assert_eq!(record["depth"], 72.0);
        assert!(record.get("region").is_none());
        assert!(!tmp.join(".data.json.tmp").exists());

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn raw_json_failure_leaves_no_files() {
        let tmp = temp_dir();
        let path = tmp.join("missing").join("data.json");
        let run_id = RunId::new();
        let dump = RawDump {
            run_id: &run_id,
            generated_at: Utc::now(),
            sources: &[],
            count: 0,
            records: &[],
        };

        let err = write_raw_json(&path, &dump).unwrap_err();

        assert!(matches!(err, ReefPointsError::Io { .. }));
        assert!(!path.exists());
        assert!(!tmp.join("missing").join(".data.json.tmp").exists());
    }

    #[test]
    fn write_run_writes_gpx_then_json() {
        let tmp = temp_dir();
        let docs = vec![(
            "https://www.tidespro.com/fishing/us/north-carolina/raleigh-bay".to_string(),
            r#"<table class="table"><tbody>
                 <tr><td>AR-225 Concrete Pipe</td><td>Depth: 60 ft</td>
                     <td><span class="dd">34.9</span></td><td><span class="dd">-76.1</span></td></tr>
               </tbody></table>"#
                .to_string(),
        )];
        let result = extract_documents(&docs, &RegionBounds::default(), &SilentProgress);
        let paths = OutputPaths::timestamped(&tmp, "nc_fishing", stamp()).unwrap();
        let opts = GpxOptions {
            title: "North Carolina Fishing Points".into(),
            creator: "NC Fishing Points Scraper".into(),
            data_source: "TidesPro.com".into(),
            generated_at: Utc::now(),
        };

        let output = write_run(&result, &paths, &opts, true).unwrap();

        assert_eq!(output.gpx.waypoints, 1);
        let gpx = std::fs::read_to_string(&paths.gpx).unwrap();
        assert!(gpx.contains("<name>AR-225</name>"));
        assert!(gpx.contains("<type>Concrete Reef</type>"));
        assert_eq!(output.json.as_deref(), Some(paths.json.as_path()));
        let json = std::fs::read_to_string(&paths.json).unwrap();
        assert!(json.contains("\"state\": \"North Carolina\""));

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn write_run_without_json() {
        let tmp = temp_dir();
        let docs = vec![(
            "page".to_string(),
            r#"<script>var m = {"lat": 35.1, "lng": -75.9};</script>"#.to_string(),
        )];
        let result = extract_documents(&docs, &RegionBounds::default(), &SilentProgress);
        let paths = OutputPaths::timestamped(&tmp, "test", stamp()).unwrap();
        let opts = GpxOptions {
            title: "t".into(),
            creator: "c".into(),
            data_source: "d".into(),
            generated_at: Utc::now(),
        };

        let output = write_run(&result, &paths, &opts, false).unwrap();

        assert!(output.json.is_none());
        assert!(paths.gpx.exists());
        assert!(!paths.json.exists());

        let _ = std::fs::remove_dir_all(&tmp);
    }
}
