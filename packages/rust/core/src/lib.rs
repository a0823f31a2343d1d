//! Core pipeline orchestration and domain logic for reefpoints.
//!
//! This crate ties together fetching, extraction, aggregation and output
//! naming into end-to-end runs (e.g., [`pipeline::scrape`]).

pub mod aggregate;
pub mod output;
pub mod pipeline;
