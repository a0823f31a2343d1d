//! Shared types, error model, and configuration for reefpoints.
//!
//! This crate is the foundation depended on by all other reefpoints crates.
//! It provides:
//! - [`ReefPointsError`], the unified error type
//! - Domain types ([`LocationRecord`], [`StructureType`], [`Symbol`], [`RunId`])
//! - Configuration ([`AppConfig`], [`PipelineConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, FetchConfig, OutputConfig, PipelineConfig, RegionBounds,
    ScrapeConfig, config_dir, config_file_path, init_config, load_config, load_config_from,
};
pub use error::{ReefPointsError, Result};
pub use types::{LocationRecord, RunId, StructureType, Symbol};
