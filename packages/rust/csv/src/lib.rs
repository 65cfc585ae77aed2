//! CSV export of a finished run.
//!
//! Every table is bound to its fixed column list before writing, so the
//! header never depends on which fields happened to be present. The
//! articles table always uses `;`; the summary export always uses `,`.

mod binder;
mod manifest;
mod writer;

use std::path::PathBuf;

use chrono::{Local, Utc};
use tracing::{info, instrument};

use tecdoc_core::RunContext;
use tecdoc_shared::{Result, Table};

pub use binder::{BoundTable, bind, bind_table, dedupe_by, summary_columns};
pub use manifest::{ManifestFile, RunManifest};
pub use writer::{ExportOutcome, default_filename, write_csv};

/// Delimiter of the articles table.
pub const ARTICLES_DELIMITER: char = ';';

/// Delimiter of the summary export.
pub const SUMMARY_DELIMITER: char = ',';

/// File stem of the summary export.
pub const SUMMARY_STEM: &str = "tecdoc_export";

/// Where and how to write a run.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub output_dir: PathBuf,
    /// Delimiter of every table except articles and the summary.
    pub delimiter: char,
    /// Explicit articles file; defaults to a timestamped name in `output_dir`.
    pub articles_file: Option<PathBuf>,
    /// Also write the summary export.
    pub summary: bool,
    pub write_manifest: bool,
    pub tool_version: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            delimiter: ARTICLES_DELIMITER,
            articles_file: None,
            summary: false,
            write_manifest: true,
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Outcome of one written (or skipped) file.
#[derive(Debug, Clone)]
pub struct FileReport {
    /// Table name, or `summary`.
    pub name: String,
    pub outcome: ExportOutcome,
}

/// Everything [`export_run`] produced.
#[derive(Debug, Clone, Default)]
pub struct ExportReport {
    pub files: Vec<FileReport>,
    pub manifest: Option<PathBuf>,
}

impl ExportReport {
    /// The articles outcome, `Empty` if the articles table had no rows.
    pub fn articles(&self) -> ExportOutcome {
        self.files
            .iter()
            .find(|f| f.name == Table::Articles.name())
            .map(|f| f.outcome.clone())
            .unwrap_or(ExportOutcome::Empty)
    }

    pub fn written(&self) -> impl Iterator<Item = &FileReport> {
        self.files
            .iter()
            .filter(|f| matches!(f.outcome, ExportOutcome::Written { .. }))
    }
}

/// Write every table of `ctx` (articles first), the optional summary, and
/// the manifest. Tables other than articles are skipped when empty.
#[instrument(skip_all, fields(run_id = %ctx.run_id, output_dir = %options.output_dir.display()))]
pub fn export_run(ctx: &RunContext, options: &ExportOptions) -> Result<ExportReport> {
    let now = Local::now();
    let mut report = ExportReport::default();

    let articles_path = options.articles_file.clone().unwrap_or_else(|| {
        options
            .output_dir
            .join(default_filename(Table::Articles.name(), now))
    });
    let bound = bind_table(Table::Articles, ctx.records(Table::Articles));
    report.files.push(FileReport {
        name: Table::Articles.name().to_string(),
        outcome: write_csv(&articles_path, &bound, ARTICLES_DELIMITER)?,
    });

    for table in ctx.non_empty_tables().filter(|&t| t != Table::Articles) {
        let path = options.output_dir.join(default_filename(table.name(), now));
        let bound = bind_table(table, ctx.records(table));
        report.files.push(FileReport {
            name: table.name().to_string(),
            outcome: write_csv(&path, &bound, options.delimiter)?,
        });
    }

    if options.summary {
        let summaries = ctx.summaries();
        let path = options.output_dir.join(default_filename(SUMMARY_STEM, now));
        let bound = bind(summaries, &summary_columns(summaries));
        report.files.push(FileReport {
            name: "summary".to_string(),
            outcome: write_csv(&path, &bound, SUMMARY_DELIMITER)?,
        });
    }

    if options.write_manifest && report.written().next().is_some() {
        let manifest = RunManifest {
            run_id: ctx.run_id.clone(),
            tool_version: options.tool_version.clone(),
            started_at: ctx.started_at,
            finished_at: Utc::now(),
            files: report
                .written()
                .map(|f| ManifestFile {
                    table: f.name.clone(),
                    file: f
                        .outcome
                        .path()
                        .and_then(|p| p.file_name())
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default(),
                    rows: f.outcome.rows(),
                })
                .collect(),
            skipped_articles: ctx.skipped(),
        };
        let stem = format!("manifest_{}.json", now.format("%Y%m%d_%H%M%S"));
        let dir = articles_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| options.output_dir.clone());
        report.manifest = Some(manifest.write(&dir.join(stem))?);
    }

    info!(
        files = report.written().count(),
        articles = report.articles().rows(),
        "export written"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tecdoc_shared::Record;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("tecdoc-export-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn sample_context() -> RunContext {
        let mut ctx = RunContext::new();
        ctx.push(
            Table::Articles,
            Record::new()
                .with("article_id", "100")
                .with("category_path", "Brakes")
                .with("is_accessory", "true"),
        );
        ctx.push(Table::Brands, Record::new().with("supplier_id", "355"));
        ctx.push(Table::Brands, Record::new().with("supplier_id", "355"));
        ctx.push_summary(
            Record::new()
                .with("article_id", "100")
                .with("image_100px", "u100")
                .with("raw_article_data", "{\"a\":1}"),
        );
        ctx
    }

    #[test]
    fn exports_articles_brands_summary_and_manifest() {
        let tmp = temp_dir();
        let options = ExportOptions {
            output_dir: tmp.clone(),
            summary: true,
            ..ExportOptions::default()
        };

        let report = export_run(&sample_context(), &options).unwrap();
        let names: Vec<_> = report.written().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["articles", "brands", "summary"]);

        let articles = report.articles();
        let content = std::fs::read_to_string(articles.path().unwrap()).unwrap();
        let mut lines = content.lines();
        let header = lines.next().unwrap();
        assert_eq!(header.split(';').count(), 29);
        assert!(header.starts_with("article_id;supplier_id;brand_name"));
        let row: Vec<_> = lines.next().unwrap().split(';').collect();
        assert_eq!(row[0], "100");
        assert_eq!(row[6], "Brakes");
        assert_eq!(row[20], "true");

        let brands = &report.files[1];
        assert_eq!(brands.outcome.rows(), 1);

        let summary = std::fs::read_to_string(report.files[2].outcome.path().unwrap()).unwrap();
        assert!(summary.starts_with(
            "manufacturer_item_number,article_id,article_name,manufacturer_id,manufacturer_name,\
             gtins,category_hierarchy,vehicle_types_found,image_100px,vehicle_applications_count"
        ));

        let manifest = RunManifest::read(report.manifest.as_ref().unwrap()).unwrap();
        assert_eq!(manifest.files.len(), 3);
        assert_eq!(manifest.total_rows(), 3);

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn empty_run_writes_nothing() {
        let tmp = temp_dir();
        let options = ExportOptions {
            output_dir: tmp.clone(),
            summary: true,
            ..ExportOptions::default()
        };

        let report = export_run(&RunContext::new(), &options).unwrap();
        assert_eq!(report.articles(), ExportOutcome::Empty);
        assert!(report.manifest.is_none());
        assert_eq!(std::fs::read_dir(&tmp).unwrap().count(), 0);

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn explicit_articles_file_is_honored() {
        let tmp = temp_dir();
        let target = tmp.join("out").join("my_articles.csv");
        let options = ExportOptions {
            output_dir: tmp.clone(),
            articles_file: Some(target.clone()),
            write_manifest: false,
            ..ExportOptions::default()
        };

        let report = export_run(&sample_context(), &options).unwrap();
        assert_eq!(report.articles().path(), Some(target.as_path()));
        assert!(target.exists());
        assert!(report.manifest.is_none());

        let _ = std::fs::remove_dir_all(&tmp);
    }
}
