//! Delimited file output.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::{debug, instrument, warn};

use tecdoc_shared::{Result, TecdocError};

use crate::binder::BoundTable;

/// What a write attempt produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Written { path: PathBuf, rows: usize },
    /// Nothing to write; no file was created.
    Empty,
}

impl ExportOutcome {
    pub fn path(&self) -> Option<&Path> {
        match self {
            ExportOutcome::Written { path, .. } => Some(path),
            ExportOutcome::Empty => None,
        }
    }

    pub fn rows(&self) -> usize {
        match self {
            ExportOutcome::Written { rows, .. } => *rows,
            ExportOutcome::Empty => 0,
        }
    }
}

/// `<stem>_YYYYmmdd_HHMMSS.csv`.
pub fn default_filename(stem: &str, now: DateTime<Local>) -> String {
    format!("{stem}_{}.csv", now.format("%Y%m%d_%H%M%S"))
}

/// Write a header row plus every bound row, UTF-8, `\n`-terminated.
///
/// The file is written next to `path` under a temporary name and renamed
/// into place once complete.
#[instrument(skip_all, fields(path = %path.display(), rows = table.len()))]
pub fn write_csv(path: &Path, table: &BoundTable, delimiter: char) -> Result<ExportOutcome> {
    if table.is_empty() {
        warn!("no rows to export");
        return Ok(ExportOutcome::Empty);
    }
    if !delimiter.is_ascii() {
        return Err(TecdocError::validation(format!(
            "delimiter must be a single ASCII character, got '{delimiter}'"
        )));
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| TecdocError::io(parent, e))?;
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| TecdocError::validation(format!("not a file path: {}", path.display())))?;
    let temp = path.with_file_name(format!(".{file_name}.tmp"));

    if let Err(e) = write_rows(&temp, table, delimiter) {
        let _ = std::fs::remove_file(&temp);
        return Err(e);
    }

    if let Err(e) = std::fs::rename(&temp, path) {
        let _ = std::fs::remove_file(&temp);
        return Err(TecdocError::io(path, e));
    }
    debug!(columns = table.columns.len(), "wrote CSV file");

    Ok(ExportOutcome::Written {
        path: path.to_path_buf(),
        rows: table.len(),
    })
}

fn write_rows(temp: &Path, table: &BoundTable, delimiter: char) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter as u8)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_path(temp)
        .map_err(|e| TecdocError::Export(format!("{}: {e}", temp.display())))?;

    writer
        .write_record(&table.columns)
        .map_err(|e| TecdocError::Export(e.to_string()))?;
    for row in &table.rows {
        writer
            .write_record(row)
            .map_err(|e| TecdocError::Export(e.to_string()))?;
    }
    writer.flush().map_err(|e| TecdocError::io(temp, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binder::bind;
    use chrono::TimeZone;
    use tecdoc_shared::Record;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("tecdoc-csv-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn writes_header_and_rows_with_delimiter() {
        let tmp = temp_dir();
        let path = tmp.join("articles.csv");
        let records = vec![
            Record::new().with("a", "1").with("b", "x;y"),
            Record::new().with("a", "2"),
        ];

        let outcome = write_csv(&path, &bind(&records, &["a", "b"]), ';').unwrap();
        assert_eq!(outcome.rows(), 2);
        assert_eq!(outcome.path(), Some(path.as_path()));

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "a;b\n1;\"x;y\"\n2;\n");
        assert!(!tmp.join(".articles.csv.tmp").exists());

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn empty_table_is_not_written() {
        let tmp = temp_dir();
        let path = tmp.join("empty.csv");

        let outcome = write_csv(&path, &bind::<&str>(&[], &["a"]), ',').unwrap();
        assert_eq!(outcome, ExportOutcome::Empty);
        assert!(!path.exists());

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_non_ascii_delimiter() {
        let tmp = temp_dir();
        let records = vec![Record::new().with("a", "1")];
        let err = write_csv(&tmp.join("x.csv"), &bind(&records, &["a"]), '§').unwrap_err();
        assert!(err.to_string().contains("delimiter"));

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn failed_write_leaves_no_temp_file() {
        let tmp = temp_dir();
        let path = tmp.join("ragged.csv");
        let table = BoundTable {
            columns: vec!["a".into(), "b".into()],
            rows: vec![vec!["only one".into()]],
        };

        let err = write_csv(&path, &table, ',').unwrap_err();
        assert!(matches!(err, TecdocError::Export(_)));
        assert!(!path.exists());
        assert!(!tmp.join(".ragged.csv.tmp").exists());

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn creates_missing_parent_directories() {
        let tmp = temp_dir();
        let path = tmp.join("nested/out/brands.csv");
        let records = vec![Record::new().with("a", "1")];

        write_csv(&path, &bind(&records, &["a"]), ',').unwrap();
        assert!(path.exists());

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn default_filename_is_timestamped() {
        let now = Local.with_ymd_and_hms(2025, 3, 7, 9, 5, 1).unwrap();
        assert_eq!(default_filename("articles", now), "articles_20250307_090501.csv");
    }
}
