//! TrendScout Runner: batch ranking on top of `trendscout-core`.
//!
//! This crate provides:
//! - Series loading from CSV/JSON with column mapping, plus synthetic data
//! - Dataset hashing for report provenance
//! - Parallel per-symbol analysis with failure isolation
//! - Ranking and truncation of recommendations
//! - JSON and Markdown export of the batch report

pub mod batch;
pub mod config;
pub mod data_loader;
pub mod export;

pub use batch::{run_from_config, BatchFailure, BatchReport, BatchRunner, FailureStage, RunError, SymbolOutcome};
pub use config::{ConfigError, RunConfig};
pub use data_loader::{
    dataset_hash, load_directory, load_series, read_csv, synthetic_series, synthetic_universe,
    ColumnMap, LoadError, LoadFailure, LoadedUniverse, SymbolSeries,
};
pub use export::{save_report, summary_markdown};
