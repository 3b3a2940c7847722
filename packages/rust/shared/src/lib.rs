//! Shared types, error model, and configuration for Tijdmachine.
//!
//! This crate is the foundation depended on by all other Tijdmachine crates.
//! It provides:
//! - [`TijdmachineError`] — the unified error type
//! - Domain types ([`ArticleRecord`], [`Language`], [`EnrichmentResult`])
//! - Day-of-year arithmetic ([`calendar`])
//! - Service contracts ([`TextGenerator`], [`KnowledgeLookup`])
//! - Configuration ([`AppConfig`], [`EnrichmentConfig`], config loading)

pub mod calendar;
pub mod config;
pub mod error;
pub mod services;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, EnrichmentConfig, EnrichmentSettings, OpenAiConfig,
    WikipediaConfig, config_dir, config_file_path, database_path, init_config, load_config,
    load_config_from, resolve_api_key,
};
pub use error::{Result, TijdmachineError};
pub use services::{KnowledgeLookup, TextGenerator};
pub use types::{ArticleRecord, ContextEntry, EnrichmentResult, Language};
