//! Normalization core for the TecDoc exporter.
//!
//! Turns loosely-shaped catalog payloads into flat, schema-stable records:
//! field extraction with fallbacks, media deduplication, category path
//! reconstruction, per-table record builders, and the export pipeline
//! that sequences the catalog calls.

pub mod context;
pub mod extract;
pub mod gallery;
pub mod hierarchy;
pub mod pipeline;
pub mod records;

pub use context::RunContext;
pub use hierarchy::{CategoryPath, Classification, ClassificationNode, ClassificationSummary};
pub use pipeline::{
    ExportRequest, ProgressReporter, SilentProgress, export_article, export_articles,
    normalize_response,
};
