//! Core domain types: output tables, canonical records, and run identifiers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TecdocError;

// ---------------------------------------------------------------------------
// RunId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper identifying one export run (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Generate a new time-sortable run identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RunId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ---------------------------------------------------------------------------
// Column schemas
// ---------------------------------------------------------------------------

/// Fixed column order of `articles.csv`.
pub const ARTICLE_COLUMNS: &[&str] = &[
    "article_id",
    "supplier_id",
    "brand_name",
    "article_number",
    "generic_article_id",
    "generic_article_description",
    "category_path",
    "category_node_ids",
    "short_description",
    "note",
    "image_primary_url_50",
    "image_primary_url_100",
    "image_primary_url_200",
    "image_primary_url_400",
    "image_primary_url_800",
    "image_doc_ids",
    "image_doc_filenames",
    "image_doc_types",
    "image_gallery_urls",
    "pdf_urls",
    "is_accessory",
    "article_status_id",
    "article_status_description",
    "article_status_valid_from_date",
    "quantity_per_package",
    "quantity_per_part_per_package",
    "is_self_service_packing",
    "has_mandatory_material_certification",
    "is_remanufactured_part",
];

pub const ATTRIBUTE_COLUMNS: &[&str] = &[
    "article_id",
    "criteria_id",
    "criteria_description",
    "criteria_abbr",
    "value_raw",
    "value_formatted",
    "unit",
    "immediate_display",
    "is_interval",
];

pub const REFERENCE_COLUMNS: &[&str] = &["article_id", "ref_type", "number", "mfr_name"];

pub const VEHICLE_COLUMNS: &[&str] = &[
    "article_id",
    "vehicle_mfr_name",
    "model_series_name",
    "type_name",
    "year_from",
    "year_to",
    "engine_cc",
    "power_hp",
    "fuel_type",
    "body_style",
    "drive_type",
    "kba_numbers",
    "engine_code",
    "other_restrictions",
];

pub const COMPONENT_COLUMNS: &[&str] = &[
    "parent_article_id",
    "component_article_id",
    "qty",
    "component_note",
];

pub const ARTICLE_RELATION_COLUMNS: &[&str] =
    &["article_id_from", "relation_type", "article_id_to", "note"];

pub const BRAND_COLUMNS: &[&str] = &[
    "supplier_id",
    "brand_name",
    "www_url",
    "email",
    "phone",
    "fax",
    "status",
    "status_badge_url",
    "logo_url_100",
    "logo_url_200",
    "logo_url_400",
    "logo_url_800",
    "zip_country_iso",
    "city",
    "zip",
    "street",
    "name",
    "name2",
];

/// Leading columns of the generic multi-record (summary) export.
pub const SUMMARY_BASE_COLUMNS: &[&str] = &[
    "manufacturer_item_number",
    "article_id",
    "article_name",
    "manufacturer_id",
    "manufacturer_name",
    "gtins",
    "category_hierarchy",
    "vehicle_types_found",
];

/// Vehicle columns of the summary export, placed after the image columns.
pub const SUMMARY_VEHICLE_COLUMNS: &[&str] = &[
    "vehicle_applications_count",
    "vehicle_manufacturers",
    "vehicle_models",
    "restriction_texts",
    "vehicle_applications",
];

/// Final column of the summary export: the article payload as JSON.
pub const RAW_ARTICLE_COLUMN: &str = "raw_article_data";

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

/// A named output table. Each table has one fixed column schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Articles,
    Attributes,
    References,
    Vehicles,
    Components,
    ArticleRelations,
    Brands,
}

impl Table {
    /// All tables, in export order.
    pub const ALL: [Table; 7] = [
        Table::Articles,
        Table::Attributes,
        Table::References,
        Table::Vehicles,
        Table::Components,
        Table::ArticleRelations,
        Table::Brands,
    ];

    /// The table's name, also used as its file stem.
    pub fn name(self) -> &'static str {
        match self {
            Table::Articles => "articles",
            Table::Attributes => "attributes",
            Table::References => "references",
            Table::Vehicles => "vehicles",
            Table::Components => "components",
            Table::ArticleRelations => "article_relations",
            Table::Brands => "brands",
        }
    }

    /// The fixed, ordered column list of this table.
    pub fn columns(self) -> &'static [&'static str] {
        match self {
            Table::Articles => ARTICLE_COLUMNS,
            Table::Attributes => ATTRIBUTE_COLUMNS,
            Table::References => REFERENCE_COLUMNS,
            Table::Vehicles => VEHICLE_COLUMNS,
            Table::Components => COMPONENT_COLUMNS,
            Table::ArticleRelations => ARTICLE_RELATION_COLUMNS,
            Table::Brands => BRAND_COLUMNS,
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Table {
    type Err = TecdocError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Table::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| TecdocError::validation(format!("unknown table '{s}'")))
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// A canonical record: a flat field-name → value mapping for one output row.
///
/// All values are already stringified; an absent field binds to `""`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(BTreeMap<String, String>);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.0.insert(field.into(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// The field's value, or `""` if absent.
    pub fn value(&self, field: &str) -> &str {
        self.get(field).unwrap_or("")
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_id_roundtrip() {
        let id = RunId::new();
        let s = id.to_string();
        let parsed: RunId = s.parse().expect("parse RunId");
        assert_eq!(id, parsed);
    }

    #[test]
    fn table_names_roundtrip() {
        for table in Table::ALL {
            let parsed: Table = table.name().parse().expect("parse table");
            assert_eq!(parsed, table);
        }
        assert!("wheels".parse::<Table>().is_err());
    }

    #[test]
    fn article_schema_is_stable() {
        assert_eq!(ARTICLE_COLUMNS.len(), 29);
        assert_eq!(ARTICLE_COLUMNS[0], "article_id");
        assert_eq!(ARTICLE_COLUMNS[28], "is_remanufactured_part");
    }

    #[test]
    fn record_value_defaults_to_empty() {
        let record = Record::new().with("article_id", "100");
        assert_eq!(record.value("article_id"), "100");
        assert_eq!(record.value("note"), "");
        assert_eq!(record.get("note"), None);
    }

    #[test]
    fn record_serializes_as_flat_map() {
        let record: Record = [("a", "1"), ("b", "")].into_iter().collect();
        let json = serde_json::to_string(&record).expect("serialize");
        assert_eq!(json, r#"{"a":"1","b":""}"#);
    }
}
