//! Application configuration for reefpoints.
//!
//! User config lives at `~/.reefpoints/reefpoints.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ReefPointsError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "reefpoints.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".reefpoints";

/// Source pages scraped when the config file names none.
const DEFAULT_SOURCES: [&str; 5] = [
    "https://www.tidespro.com/fishing/us/north-carolina/estuarine",
    "https://www.tidespro.com/fishing/us/north-carolina/long-bay",
    "https://www.tidespro.com/fishing/us/north-carolina/onslow-bay",
    "https://www.tidespro.com/fishing/us/north-carolina/outer-banks",
    "https://www.tidespro.com/fishing/us/north-carolina/raleigh-bay",
];

// ---------------------------------------------------------------------------
// Config structs (matching reefpoints.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Source list and fetch politeness settings.
    #[serde(default)]
    pub scrape: ScrapeConfig,

    /// Regional bounds used to classify coordinate cells.
    #[serde(default)]
    pub bounds: RegionBounds,

    /// Output file settings.
    #[serde(default)]
    pub output: OutputConfig,
}

/// `[scrape]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeConfig {
    /// Source page URLs, processed in this order.
    #[serde(default = "default_sources")]
    pub sources: Vec<String>,

    /// Delay before each request, in milliseconds.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Attempts per page before giving up.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// User-Agent header sent with each request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            sources: default_sources(),
            delay_ms: default_delay_ms(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_sources() -> Vec<String> {
    DEFAULT_SOURCES.iter().map(|s| (*s).to_string()).collect()
}
fn default_delay_ms() -> u64 {
    1000
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_max_retries() -> u32 {
    3
}
fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36"
        .into()
}

/// `[bounds]` section: the service region's known extent.
///
/// A decimal-degree cell inside `lat_min..=lat_max` is read as latitude, one
/// inside `lon_min..=lon_max` as longitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionBounds {
    #[serde(default = "default_lat_min")]
    pub lat_min: f64,
    #[serde(default = "default_lat_max")]
    pub lat_max: f64,
    #[serde(default = "default_lon_min")]
    pub lon_min: f64,
    #[serde(default = "default_lon_max")]
    pub lon_max: f64,
}

impl RegionBounds {
    pub fn contains_latitude(&self, value: f64) -> bool {
        (self.lat_min..=self.lat_max).contains(&value)
    }

    pub fn contains_longitude(&self, value: f64) -> bool {
        (self.lon_min..=self.lon_max).contains(&value)
    }
}

impl Default for RegionBounds {
    fn default() -> Self {
        Self {
            lat_min: default_lat_min(),
            lat_max: default_lat_max(),
            lon_min: default_lon_min(),
            lon_max: default_lon_max(),
        }
    }
}

fn default_lat_min() -> f64 {
    25.0
}
fn default_lat_max() -> f64 {
    50.0
}
fn default_lon_min() -> f64 {
    -85.0
}
fn default_lon_max() -> f64 {
    -75.0
}

/// `[output]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory that receives the GPX (and JSON) files.
    #[serde(default = "default_output_dir")]
    pub dir: String,

    /// File name prefix, e.g. `nc_fishing` -> `nc_fishing_points_<stamp>.gpx`.
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,

    /// GPX metadata title.
    #[serde(default = "default_title")]
    pub title: String,

    /// GPX `creator` attribute.
    #[serde(default = "default_creator")]
    pub creator: String,

    /// Data source named in the GPX metadata description.
    #[serde(default = "default_data_source")]
    pub data_source: String,

    /// Whether to also write the raw JSON dump.
    #[serde(default = "default_true")]
    pub write_json: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            file_prefix: default_file_prefix(),
            title: default_title(),
            creator: default_creator(),
            data_source: default_data_source(),
            write_json: true,
        }
    }
}

fn default_output_dir() -> String {
    "point_files".into()
}
fn default_file_prefix() -> String {
    "nc_fishing".into()
}
fn default_title() -> String {
    "North Carolina Fishing Points".into()
}
fn default_creator() -> String {
    "NC Fishing Points Scraper".into()
}
fn default_data_source() -> String {
    "TidesPro.com".into()
}
fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Runtime config (merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime fetch configuration for the HTTP collaborator.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Delay before each request in ms.
    pub delay_ms: u64,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Attempts per page (at least one is always made).
    pub max_retries: u32,
    /// User-Agent header value.
    pub user_agent: String,
}

impl From<&ScrapeConfig> for FetchConfig {
    fn from(config: &ScrapeConfig) -> Self {
        Self {
            delay_ms: config.delay_ms,
            timeout_secs: config.timeout_secs,
            max_retries: config.max_retries,
            user_agent: config.user_agent.clone(),
        }
    }
}

/// Runtime pipeline configuration, passed explicitly into the pipeline entry points.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Sources in declaration order; first-seen dedup follows this order.
    pub sources: Vec<Url>,
    /// Regional coordinate bounds for cell classification.
    pub bounds: RegionBounds,
    /// HTTP fetch settings.
    pub fetch: FetchConfig,
}

impl PipelineConfig {
    /// Build the runtime config, rejecting unparseable or non-HTTP source URLs.
    pub fn from_app_config(config: &AppConfig) -> Result<Self> {
        let sources = config
            .scrape
            .sources
            .iter()
            .map(|s| parse_source_url(s))
            .collect::<Result<Vec<_>>>()?;

        validate_bounds(&config.bounds)?;

        Ok(Self {
            sources,
            bounds: config.bounds,
            fetch: FetchConfig::from(&config.scrape),
        })
    }
}

/// Parse one source URL, accepting only `http` and `https`.
fn parse_source_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw)
        .map_err(|e| ReefPointsError::config(format!("invalid source URL '{raw}': {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ReefPointsError::config(format!(
            "unsupported scheme '{other}' in source URL '{raw}'"
        ))),
    }
}

fn validate_bounds(bounds: &RegionBounds) -> Result<()> {
    if bounds.lat_min > bounds.lat_max || bounds.lon_min > bounds.lon_max {
        return Err(ReefPointsError::config(format!(
            "inverted region bounds: {bounds:?}"
        )));
    }
    if bounds.lat_min < -90.0 || bounds.lat_max > 90.0 {
        return Err(ReefPointsError::config("latitude bounds exceed [-90, 90]"));
    }
    if bounds.lon_min < -180.0 || bounds.lon_max > 180.0 {
        return Err(ReefPointsError::config("longitude bounds exceed [-180, 180]"));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.reefpoints/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ReefPointsError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.reefpoints/reefpoints.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ReefPointsError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        ReefPointsError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| ReefPointsError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| ReefPointsError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ReefPointsError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
