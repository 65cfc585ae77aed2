//! Shared types, error model, and configuration for the TecDoc exporter.
//!
//! This crate is the foundation depended on by all other workspace crates.
//! It provides:
//! - [`TecdocError`] — the unified error type
//! - Domain types ([`Table`], [`Record`], [`RunId`]) and the fixed column schemas
//! - Configuration ([`AppConfig`], [`ApiConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    ApiConfig, AppConfig, ExportConfig, FetchConfig, config_dir, config_file_path, init_config,
    load_config, load_config_from,
};
pub use error::{Result, TecdocError};
pub use types::{
    ARTICLE_COLUMNS, ARTICLE_RELATION_COLUMNS, ATTRIBUTE_COLUMNS, BRAND_COLUMNS,
    COMPONENT_COLUMNS, RAW_ARTICLE_COLUMN, REFERENCE_COLUMNS, Record, RunId,
    SUMMARY_BASE_COLUMNS, SUMMARY_VEHICLE_COLUMNS, Table, VEHICLE_COLUMNS,
};
