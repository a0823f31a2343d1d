//! reefpoints CLI: marine structure waypoints for GPS units.
//!
//! Scrapes wreck and artificial reef tables from fishing-data pages and
//! writes them out as a GPX file with Garmin extensions.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
