//! `manifest_<timestamp>.json`: what one export run wrote.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use tecdoc_shared::{Result, RunId, TecdocError};

/// One written file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestFile {
    /// Table name, or `summary`.
    pub table: String,
    pub file: String,
    pub rows: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub run_id: RunId,
    pub tool_version: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub files: Vec<ManifestFile>,
    /// Articles dropped for a missing legacy id.
    pub skipped_articles: usize,
}

impl RunManifest {
    /// Write pretty-printed JSON to `path` via a temporary sibling.
    pub fn write(&self, path: &Path) -> Result<PathBuf> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| TecdocError::validation(format!("JSON serialization failed: {e}")))?;

        let temp = path.with_extension("json.tmp");
        std::fs::write(&temp, json).map_err(|e| TecdocError::io(&temp, e))?;
        std::fs::rename(&temp, path).map_err(|e| TecdocError::io(path, e))?;

        debug!(path = %path.display(), files = self.files.len(), "wrote manifest");
        Ok(path.to_path_buf())
    }

    pub fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| TecdocError::io(path, e))?;
        serde_json::from_str(&content)
            .map_err(|e| TecdocError::parse(format!("invalid manifest {}: {e}", path.display())))
    }

    pub fn total_rows(&self) -> usize {
        self.files.iter().map(|f| f.rows).sum()
    }
}
