//! Shared types, error model, and configuration for Skimmer.
//!
//! This crate is the foundation depended on by all other Skimmer crates.
//! It provides:
//! - [`SkimmerError`] — the unified error type
//! - Domain types ([`Record`], [`EnrichedRecord`], [`Generation`], [`ResultSet`])
//! - Configuration ([`AppConfig`], [`EnrichmentConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, BackendConfig, EnrichmentConfig, EnrichmentSettings, MAX_SPACING, SummarizerConfig,
    config_dir, config_file_path, init_config, load_config, load_config_from, validate_api_key,
};
pub use error::{Result, SkimmerError};
pub use types::{
    EnrichedRecord, Generation, Record, ResultSet, SUMMARY_FAILED_PLACEHOLDER, SearchRequest,
    SearchResponse, SummaryState,
};
