//! Binding canonical records to fixed column lists.

use std::collections::HashSet;

use tecdoc_shared::{
    RAW_ARTICLE_COLUMN, Record, SUMMARY_BASE_COLUMNS, SUMMARY_VEHICLE_COLUMNS, Table,
};

/// Rows laid out against an ordered column list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundTable {
    pub columns: Vec<String>,
    /// One value per column, in column order.
    pub rows: Vec<Vec<String>>,
}

impl BoundTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Reindex records against `columns`: missing fields become `""`, fields
/// outside the list are dropped.
pub fn bind<S: AsRef<str>>(records: &[Record], columns: &[S]) -> BoundTable {
    let rows = records
        .iter()
        .map(|record| {
            columns
                .iter()
                .map(|column| record.value(column.as_ref()).to_string())
                .collect()
        })
        .collect();

    BoundTable {
        columns: columns.iter().map(|c| c.as_ref().to_string()).collect(),
        rows,
    }
}

/// Bind a table against its own schema. Brand rows are first deduplicated
/// by `supplier_id`, keeping the first.
pub fn bind_table(table: Table, records: &[Record]) -> BoundTable {
    if table == Table::Brands {
        let unique = dedupe_by(records, "supplier_id");
        return bind(&unique, table.columns());
    }
    bind(records, table.columns())
}

/// First record per distinct value of `field`.
pub fn dedupe_by(records: &[Record], field: &str) -> Vec<Record> {
    let mut seen = HashSet::new();
    records
        .iter()
        .filter(|record| seen.insert(record.value(field).to_string()))
        .cloned()
        .collect()
}

/// Summary columns: fixed base, the first record's `image_*` columns
/// sorted, vehicle columns, then the raw payload.
pub fn summary_columns(records: &[Record]) -> Vec<String> {
    let mut images: Vec<&str> = records
        .first()
        .map(|r| r.fields().filter(|f| f.starts_with("image_")).collect())
        .unwrap_or_default();
    images.sort_unstable();

    SUMMARY_BASE_COLUMNS
        .iter()
        .copied()
        .chain(images)
        .chain(SUMMARY_VEHICLE_COLUMNS.iter().copied())
        .chain([RAW_ARTICLE_COLUMN])
        .map(str::to_string)
        .collect()
}
