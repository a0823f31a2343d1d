//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use chrono::Local;
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use reefpoints_core::output::{OutputPaths, write_run};
use reefpoints_core::pipeline::{
    ProgressReporter, ScrapeResult, SourceReport, extract_documents, scrape,
};
use reefpoints_fetcher::Fetcher;
use reefpoints_gpx::GpxOptions;
use reefpoints_shared::{
    AppConfig, OutputConfig, PipelineConfig, init_config, load_config, load_config_from,
};
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// reefpoints: scrape fishing structures into GPX waypoints.
#[derive(Parser)]
#[command(
    name = "reefpoints",
    version,
    about = "Scrape wreck and reef locations into a GPX file for marine GPS units.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.reefpoints/reefpoints.toml.
    #[arg(long, global = true, env = "REEFPOINTS_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Options shared by commands that write output files.
#[derive(clap::Args)]
pub(crate) struct OutputArgs {
    /// Output directory (defaults to `[output] dir`).
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// File name prefix (defaults to `[output] file_prefix`).
    #[arg(long)]
    pub prefix: Option<String>,

    /// Skip the raw JSON dump.
    #[arg(long)]
    pub no_json: bool,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Fetch the configured source pages and write a GPX file.
    Scrape {
        /// Source URL to scrape; repeat to scrape several. Replaces the
        /// configured list.
        #[arg(short, long = "source")]
        sources: Vec<String>,

        /// Delay before each request, in milliseconds.
        #[arg(long)]
        delay_ms: Option<u64>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Extract locations from saved HTML files and write a GPX file.
    Extract {
        /// HTML files, processed in the order given.
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Source URL for each file, matched by position. Files without one
        /// are identified by their path.
        #[arg(long = "source-url")]
        source_urls: Vec<String>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "reefpoints=info",
        1 => "reefpoints=debug",
        _ => "reefpoints=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config;
    match cli.command {
        Command::Scrape {
            sources,
            delay_ms,
            output,
        } => cmd_scrape(config_path.as_deref(), sources, delay_ms, &output).await,
        Command::Extract {
            files,
            source_urls,
            output,
        } => cmd_extract(config_path.as_deref(), &files, &source_urls, &output).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show(config_path.as_deref()).await,
        },
    }
}

fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(p) => load_config_from(p)?,
        None => load_config()?,
    };
    Ok(config)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_scrape(
    config_path: Option<&Path>,
    sources: Vec<String>,
    delay_ms: Option<u64>,
    output: &OutputArgs,
) -> Result<()> {
    let mut config = resolve_config(config_path)?;
    if !sources.is_empty() {
        config.scrape.sources = sources;
    }
    if let Some(delay) = delay_ms {
        config.scrape.delay_ms = delay;
    }

    let pipeline = PipelineConfig::from_app_config(&config)?;
    if pipeline.sources.is_empty() {
        return Err(eyre!("no sources configured; add URLs under [scrape] sources or pass --source"));
    }
    let fetcher = Fetcher::new(&pipeline.fetch)?;

    info!(
        sources = pipeline.sources.len(),
        delay_ms = pipeline.fetch.delay_ms,
        "scraping fishing locations"
    );

    let reporter = CliProgress::new();
    let result = scrape(&pipeline, &fetcher, &reporter).await;

    write_outputs(&result, &config.output, output)
}

async fn cmd_extract(
    config_path: Option<&Path>,
    files: &[PathBuf],
    source_urls: &[String],
    output: &OutputArgs,
) -> Result<()> {
    let config = resolve_config(config_path)?;

    let mut documents = Vec::with_capacity(files.len());
    for (i, file) in files.iter().enumerate() {
        let html = std::fs::read_to_string(file)
            .map_err(|e| eyre!("cannot read '{}': {e}", file.display()))?;
        let source = source_urls
            .get(i)
            .cloned()
            .unwrap_or_else(|| file.display().to_string());
        documents.push((source, html));
    }

    info!(files = documents.len(), "extracting from saved pages");

    let reporter = CliProgress::new();
    let result = extract_documents(&documents, &config.bounds, &reporter);

    write_outputs(&result, &config.output, output)
}

/// Write the GPX file (and JSON dump) for a finished run and print a summary.
fn write_outputs(result: &ScrapeResult, config: &OutputConfig, args: &OutputArgs) -> Result<()> {
    println!();
    for source in &result.sources {
        match (&source.error, source.method) {
            (Some(error), _) => println!("  ✗ {}  ({error})", source.url),
            (None, Some(method)) => println!(
                "  ✓ {}  {} locations via {method}",
                source.url, source.records
            ),
            (None, None) => println!("  - {}", source.url),
        }
    }
    println!();

    if result.is_empty() {
        warn!("no fishing locations found");
        println!("  No fishing locations found. The website structure may have changed.");
        println!("  Inspect the source pages and update the parsing rules.");
        return Err(eyre!("no locations extracted"));
    }

    println!("  Total locations found:   {}", result.total_found);
    println!("  Unique after dedup:      {}", result.records.len());

    let dir = args.out.clone().unwrap_or_else(|| PathBuf::from(&config.dir));
    let prefix = args.prefix.as_deref().unwrap_or(&config.file_prefix);
    let paths = OutputPaths::timestamped(&dir, prefix, Local::now().naive_local())?;

    let opts = GpxOptions::from(config);
    let written = write_run(result, &paths, &opts, config.write_json && !args.no_json)
        .map_err(|e| eyre!("failed to create output files: {e}"))?;

    println!();
    println!("  GPX file:   {}", written.gpx.path.display());
    println!("  Waypoints:  {}", written.gpx.waypoints);
    println!("  Size:       {} bytes", written.gpx.bytes);
    println!("  SHA-256:    {}", written.gpx.sha256);
    if let Some(json) = &written.json {
        println!("  Raw data:   {}", json.display());
    }
    println!("  Time:       {:.1}s", result.elapsed.as_secs_f64());
    println!();

    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .expect("valid progress template")
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn source_started(&self, url: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Scraping [{current}/{total}] {url}"));
    }

    fn source_done(&self, report: &SourceReport) {
        if report.error.is_none() {
            self.spinner
                .set_message(format!("Found {} locations at {}", report.records, report.url));
        }
    }

    fn done(&self, _result: &ScrapeResult) {
        self.spinner.finish_and_clear();
    }
}

// ---------------------------------------------------------------------------
// Config commands
// ---------------------------------------------------------------------------

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = resolve_config(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
