//! Per-run accumulation of canonical records.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use tracing::warn;

use tecdoc_shared::{Record, Result, RunId, Table};

/// Everything one run has produced so far.
///
/// Tables are append-only and keep insertion order. The brand set makes
/// "is this supplier already exported" and "mark it exported" one step.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: RunId,
    pub started_at: DateTime<Utc>,
    tables: BTreeMap<Table, Vec<Record>>,
    brand_ids: HashSet<String>,
    summaries: Vec<Record>,
    skipped: usize,
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RunContext {
    pub fn new() -> Self {
        Self {
            run_id: RunId::new(),
            started_at: Utc::now(),
            tables: BTreeMap::new(),
            brand_ids: HashSet::new(),
            summaries: Vec::new(),
            skipped: 0,
        }
    }

    /// Append one record. Brand records for an already-seen supplier are dropped.
    pub fn push(&mut self, table: Table, record: Record) {
        if table == Table::Brands && !self.add_brand(record.value("supplier_id")) {
            return;
        }
        self.tables.entry(table).or_default().push(record);
    }

    pub fn extend(&mut self, table: Table, records: impl IntoIterator<Item = Record>) {
        for record in records {
            self.push(table, record);
        }
    }

    /// Append a built article, or count it as skipped when a required key
    /// was missing. Returns the article id when the row was kept.
    pub fn accept_article(&mut self, built: Result<Record>) -> Result<Option<String>> {
        match built {
            Ok(record) => {
                let id = record.value("article_id").to_string();
                self.push(Table::Articles, record);
                Ok(Some(id))
            }
            Err(e) if e.is_skip() => {
                warn!(error = %e, "skipping article");
                self.skipped += 1;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    pub fn has_brand(&self, supplier_id: &str) -> bool {
        self.brand_ids.contains(supplier_id)
    }

    /// Mark a supplier as exported. `false` if it already was.
    pub fn add_brand(&mut self, supplier_id: &str) -> bool {
        self.brand_ids.insert(supplier_id.to_string())
    }

    pub fn push_summary(&mut self, record: Record) {
        self.summaries.push(record);
    }

    /// Records of one table, in insertion order.
    pub fn records(&self, table: Table) -> &[Record] {
        self.tables.get(&table).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn summaries(&self) -> &[Record] {
        &self.summaries
    }

    /// Articles dropped for a missing legacy id.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn count(&self, table: Table) -> usize {
        self.records(table).len()
    }

    /// Tables holding at least one record, in export order.
    pub fn non_empty_tables(&self) -> impl Iterator<Item = Table> + '_ {
        Table::ALL.into_iter().filter(|&t| self.count(t) > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tecdoc_shared::TecdocError;

    #[test]
    fn second_brand_for_same_supplier_is_dropped() {
        let mut ctx = RunContext::new();
        ctx.push(Table::Brands, Record::new().with("supplier_id", "355").with("brand_name", "DT"));
        ctx.push(Table::Brands, Record::new().with("supplier_id", "355").with("brand_name", "other"));
        ctx.push(Table::Brands, Record::new().with("supplier_id", "30"));

        assert_eq!(ctx.count(Table::Brands), 2);
        assert_eq!(ctx.records(Table::Brands)[0].value("brand_name"), "DT");
        assert!(ctx.has_brand("355"));
    }

    #[test]
    fn skipped_articles_do_not_count_as_rows() {
        let mut ctx = RunContext::new();
        let kept = ctx
            .accept_article(Ok(Record::new().with("article_id", "100")))
            .unwrap();
        let skipped = ctx
            .accept_article(Err(TecdocError::missing_key("legacyArticleId")))
            .unwrap();

        assert_eq!(kept.as_deref(), Some("100"));
        assert_eq!(skipped, None);
        assert_eq!(ctx.count(Table::Articles), 1);
        assert_eq!(ctx.skipped(), 1);
    }

    #[test]
    fn other_errors_propagate() {
        let mut ctx = RunContext::new();
        let result = ctx.accept_article(Err(TecdocError::parse("bad")));
        assert!(result.is_err());
        assert_eq!(ctx.skipped(), 0);
    }

    #[test]
    fn tables_keep_insertion_order() {
        let mut ctx = RunContext::new();
        ctx.extend(
            Table::Attributes,
            ["3", "1", "2"].map(|id| Record::new().with("criteria_id", id)),
        );
        let ids: Vec<_> = ctx
            .records(Table::Attributes)
            .iter()
            .map(|r| r.value("criteria_id"))
            .collect();
        assert_eq!(ids, vec!["3", "1", "2"]);
        assert!(ctx.records(Table::Vehicles).is_empty());
        assert_eq!(ctx.non_empty_tables().collect::<Vec<_>>(), vec![Table::Attributes]);
    }

    #[test]
    fn contexts_are_independent() {
        let mut a = RunContext::new();
        let b = RunContext::new();
        a.push(Table::Articles, Record::new().with("article_id", "1"));
        assert_eq!(b.count(Table::Articles), 0);
        assert_ne!(a.run_id, b.run_id);
    }
}
