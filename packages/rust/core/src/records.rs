//! Canonical record builders, one per output table.
//!
//! Every builder takes raw payloads and returns flat [`Record`]s keyed by
//! the table's column names. Sibling endpoints (criteria, references, ...)
//! key their rows by the article's legacy id.

use std::collections::HashSet;

use serde_json::{Map, Value};
use tracing::debug;

use tecdoc_shared::{Record, Result, TecdocError, RAW_ARTICLE_COLUMN};

use crate::extract::{
    self, extract_field, extract_str, flag, is_present, scalar_to_string, BRAND_RULES, PDF_URL,
    VEHICLE_RULES,
};
use crate::gallery::{self, PRIMARY_SIZES};
use crate::hierarchy::{self, CategoryPath, ClassificationSummary};

/// Placeholder name when the direct search finds nothing.
pub const UNKNOWN_ARTICLE_NAME: &str = "N/A";

/// Boolean flags read from `misc`, as (source key, column).
const MISC_FLAGS: &[(&str, &str)] = &[
    ("isAccessory", "is_accessory"),
    ("isSelfServicePacking", "is_self_service_packing"),
    (
        "hasMandatoryMaterialCertification",
        "has_mandatory_material_certification",
    ),
    ("isRemanufacturedPart", "is_remanufactured_part"),
];

/// Plain values read from `misc`, as (source key, column).
const MISC_VALUES: &[(&str, &str)] = &[
    ("articleStatusId", "article_status_id"),
    ("articleStatusDescription", "article_status_description"),
    ("articleStatusValidFromDate", "article_status_valid_from_date"),
    ("quantityPerPackage", "quantity_per_package"),
    ("quantityPerPartPerPackage", "quantity_per_part_per_package"),
];

/// Logo sizes of the brand table.
const LOGO_SIZES: [u32; 4] = [100, 200, 400, 800];

// ---------------------------------------------------------------------------
// Articles
// ---------------------------------------------------------------------------

/// The first generic article of an article payload.
fn first_generic_article(article: &Value) -> &Map<String, Value> {
    extract::list(article, "genericArticles")
        .first()
        .map(extract::object)
        .unwrap_or_else(extract::empty_object)
}

/// The external-facing article id: `genericArticles[0].legacyArticleId`.
///
/// Absent, empty, and `0` all count as missing.
pub fn legacy_article_id(article: &Value) -> Result<String> {
    let id = extract_str(first_generic_article(article), &["legacyArticleId"], "");
    if id.is_empty() || id == "0" {
        return Err(TecdocError::missing_key("legacyArticleId"));
    }
    Ok(id)
}

/// Build the `articles` row for one article of a `getArticles` response.
///
/// `facets` is the response's `assemblyGroupFacets`; `classification` is
/// the optional classification endpoint answer used when neither the facets
/// nor the article itself name a category.
pub fn build_article(
    article: &Value,
    facets: &Value,
    classification: Option<&ClassificationSummary>,
) -> Result<Record> {
    let article_id = legacy_article_id(article)?;
    let source = extract::object(article);
    let generic = first_generic_article(article);

    let mut generic_article_id = extract_str(generic, &["genericArticleId"], "");
    let mut generic_article_description = extract_str(generic, &["genericArticleDescription"], "");
    if let Some(summary) = classification {
        if generic_article_id.is_empty() {
            generic_article_id = summary.generic_article_id.clone();
        }
        if generic_article_description.is_empty() {
            generic_article_description = summary.generic_article_description.clone();
        }
    }

    let category = article_category(article, facets, classification);

    let mut record = Record::new()
        .with("article_id", article_id)
        .with("supplier_id", extract_str(source, &["dataSupplierId"], ""))
        .with("brand_name", extract_str(source, &["mfrName"], ""))
        .with("article_number", extract_str(source, &["articleNumber"], ""))
        .with("generic_article_id", generic_article_id)
        .with("generic_article_description", generic_article_description)
        .with("category_path", category.path())
        .with("category_node_ids", category.node_ids());

    let images = extract::list(article, "images");
    let primary = gallery::primary_image_urls(images);
    for (size, url) in PRIMARY_SIZES.iter().zip(&primary) {
        record.set(format!("image_primary_url_{size}"), url.clone());
    }

    let primary_set: HashSet<String> = primary.into_iter().filter(|u| !u.is_empty()).collect();
    let media = gallery::dedupe(images, &primary_set);
    let attached_pdfs = extract::list(article, "pdfs")
        .iter()
        .map(|pdf| extract_field(extract::object(pdf), &PDF_URL));
    let pdf_urls = gallery::dedupe_strings(media.pdf_urls.into_iter().chain(attached_pdfs));

    record.set("image_doc_ids", media.doc_ids.join("|"));
    record.set("image_doc_filenames", media.filenames.join("|"));
    record.set("image_doc_types", media.doc_types.join("|"));
    record.set("image_gallery_urls", media.gallery_urls.join("|"));
    record.set("pdf_urls", pdf_urls.join("|"));

    let misc = source
        .get("misc")
        .map(extract::object)
        .unwrap_or_else(extract::empty_object);
    for &(key, column) in MISC_FLAGS {
        record.set(column, flag(misc, key));
    }
    for &(key, column) in MISC_VALUES {
        record.set(column, extract_str(misc, &[key], ""));
    }

    Ok(record)
}

/// Category precedence: facets, then the first generic article's assembly
/// group, then the classification endpoint, then the article's linkages.
pub fn article_category(
    article: &Value,
    facets: &Value,
    classification: Option<&ClassificationSummary>,
) -> CategoryPath {
    let generic = first_generic_article(article);

    hierarchy::from_facets(facets)
        .or_else(|| {
            CategoryPath::single(
                extract_str(generic, &["assemblyGroupName"], ""),
                extract_str(generic, &["assemblyGroupNodeId"], ""),
            )
        })
        .or_else(|| {
            classification
                .map(|summary| summary.category.clone())
                .unwrap_or_default()
        })
        .or_else(|| hierarchy::from_linkages(extract::list(article, "linkages")))
}

// ---------------------------------------------------------------------------
// Sibling tables
// ---------------------------------------------------------------------------

/// One record per `data.array` entry, with `key_column` set to `article_id`
/// and `mapping` copied as (source key, column).
fn rows_from(
    response: &Value,
    key_column: &str,
    article_id: &str,
    mapping: &[(&str, &str)],
    flags: &[(&str, &str)],
) -> Vec<Record> {
    extract::response_rows(response)
        .iter()
        .map(extract::object)
        .map(|row| {
            let mut record = Record::new().with(key_column, article_id);
            for &(key, column) in mapping {
                record.set(column, extract_str(row, &[key], ""));
            }
            for &(key, column) in flags {
                record.set(column, flag(row, key));
            }
            record
        })
        .collect()
}

/// `attributes` rows from a `getArticleCriteria` response.
pub fn build_attributes(article_id: &str, response: &Value) -> Vec<Record> {
    rows_from(
        response,
        "article_id",
        article_id,
        &[
            ("criteriaId", "criteria_id"),
            ("criteriaDescription", "criteria_description"),
            ("criteriaAbbr", "criteria_abbr"),
            ("valueRaw", "value_raw"),
            ("valueFormatted", "value_formatted"),
            ("unit", "unit"),
        ],
        &[
            ("immediateDisplay", "immediate_display"),
            ("isInterval", "is_interval"),
        ],
    )
}

/// `references` rows from a `getArticleReferences` response.
pub fn build_references(article_id: &str, response: &Value) -> Vec<Record> {
    rows_from(
        response,
        "article_id",
        article_id,
        &[
            ("referenceType", "ref_type"),
            ("number", "number"),
            ("mfrName", "mfr_name"),
        ],
        &[],
    )
}

/// `components` rows from a `getArticleComponents` response.
pub fn build_components(article_id: &str, response: &Value) -> Vec<Record> {
    rows_from(
        response,
        "parent_article_id",
        article_id,
        &[
            ("componentArticleId", "component_article_id"),
            ("quantity", "qty"),
            ("note", "component_note"),
        ],
        &[],
    )
}

/// `article_relations` rows from a `getArticleRelations` response.
pub fn build_relations(article_id: &str, response: &Value) -> Vec<Record> {
    rows_from(
        response,
        "article_id_from",
        article_id,
        &[
            ("relationType", "relation_type"),
            ("relatedArticleId", "article_id_to"),
            ("note", "note"),
        ],
        &[],
    )
}

// ---------------------------------------------------------------------------
// Vehicles
// ---------------------------------------------------------------------------

/// `vehicles` rows from a linkage-details response.
///
/// Entries either nest their vehicles under `linkedVehicles.array` or are
/// vehicles themselves.
pub fn build_vehicles(article_id: &str, response: &Value) -> Vec<Record> {
    let mut records = Vec::new();

    for entry in extract::response_rows(response) {
        let nested = entry.get("linkedVehicles").map(|v| extract::list(v, "array"));
        let vehicles = match nested {
            Some(list) if !list.is_empty() => list,
            _ => std::slice::from_ref(entry),
        };

        let entry_restrictions = restrictions(entry);
        for vehicle in vehicles {
            let source = extract::object(vehicle);
            let mut record = Record::new().with("article_id", article_id);
            for rule in VEHICLE_RULES {
                record.set(rule.field, extract_field(source, rule));
            }

            let own = restrictions(vehicle);
            let other = if own.is_empty() { &entry_restrictions } else { &own };
            record.set("other_restrictions", other.join("|"));
            records.push(record);
        }
    }

    debug!(article_id, vehicles = records.len(), "vehicle rows built");
    records
}

/// `"description: value"` texts of a `linkageCriteria` list (bare or `{array}`).
fn restrictions(source: &Value) -> Vec<String> {
    let criteria = match source.get("linkageCriteria") {
        Some(Value::Array(items)) => items.as_slice(),
        Some(wrapper) => extract::list(wrapper, "array"),
        None => &[],
    };

    let texts = criteria.iter().map(extract::object).filter_map(|c| {
        let description = extract_str(c, &["criteriaDescription", "description"], "");
        let value = extract_str(
            c,
            &["formattedValue", "valueFormatted", "rawValue", "valueRaw"],
            "",
        );
        match (description.is_empty(), value.is_empty()) {
            (true, true) => None,
            (false, false) => Some(format!("{description}: {value}")),
            (false, true) => Some(description),
            (true, false) => Some(value),
        }
    });
    gallery::dedupe_strings(texts)
}

// ---------------------------------------------------------------------------
// Brands
// ---------------------------------------------------------------------------

/// `brands` row from a `getBrandInfo` response.
///
/// An empty response still yields a row carrying `supplier_id`/`brand_name`.
pub fn build_brand(supplier_id: &str, brand_name: &str, response: &Value) -> Record {
    let data = response
        .get("data")
        .map(|data| extract::list(data, "array").first().unwrap_or(data));
    let source = data.map(extract::object).unwrap_or_else(extract::empty_object);
    let logos = data.map(|d| extract::list(d, "logos")).unwrap_or(&[]);

    let mut record = Record::new()
        .with("supplier_id", supplier_id)
        .with("brand_name", brand_name);
    for rule in BRAND_RULES {
        record.set(rule.field, extract_field(source, rule));
    }

    for size in LOGO_SIZES {
        record.set(format!("logo_url_{size}"), "");
    }
    for logo in logos.iter().map(extract::object) {
        for size in LOGO_SIZES {
            let keys = [
                size.to_string(),
                format!("imageURL{size}"),
                format!("logoURL{size}"),
            ];
            if let Some(url) = extract::extract(logo, &keys) {
                record.set(format!("logo_url_{size}"), scalar_to_string(url));
            }
        }
    }

    record
}

// ---------------------------------------------------------------------------
// Summary (generic multi-record export)
// ---------------------------------------------------------------------------

/// Name and internal id from a direct-search response.
pub fn direct_search_hit(response: &Value) -> (String, String) {
    match extract::response_rows(response).first().map(extract::object) {
        Some(hit) => (
            extract_str(hit, &["articleName"], UNKNOWN_ARTICLE_NAME),
            extract_str(hit, &["articleId"], ""),
        ),
        None => (UNKNOWN_ARTICLE_NAME.to_string(), String::new()),
    }
}

/// Inputs of one summary row besides the article payload.
#[derive(Debug, Clone, Copy)]
pub struct SummaryInput<'a> {
    pub article_name: &'a str,
    /// Internal id from the direct search; the legacy id is used when empty.
    pub article_id: &'a str,
    pub category: &'a str,
    /// GTINs from an enhanced lookup, used when the article carries none.
    pub fallback_gtins: &'a str,
    /// The article's `vehicles` rows.
    pub vehicles: &'a [Record],
}

/// One row of the summary export.
pub fn build_summary(article: &Value, input: SummaryInput<'_>) -> Record {
    let source = extract::object(article);
    let generic = first_generic_article(article);

    let article_name = match input.article_name {
        "" | UNKNOWN_ARTICLE_NAME => extract_str(
            generic,
            &["genericArticleDescription"],
            UNKNOWN_ARTICLE_NAME,
        ),
        name => name.to_string(),
    };
    let article_id = if input.article_id.is_empty() {
        legacy_article_id(article).unwrap_or_default()
    } else {
        input.article_id.to_string()
    };

    let gtins = source
        .get("gtins")
        .filter(|v| is_present(v))
        .map(scalar_to_string)
        .unwrap_or_else(|| input.fallback_gtins.to_string());

    let vehicle_types: HashSet<(&str, &str, &str)> = input
        .vehicles
        .iter()
        .map(|v| {
            (
                v.value("vehicle_mfr_name"),
                v.value("model_series_name"),
                v.value("type_name"),
            )
        })
        .collect();

    let column = |name: &str| {
        gallery::dedupe_strings(input.vehicles.iter().map(|v| v.value(name).to_string())).join("|")
    };
    let restriction_texts = gallery::dedupe_strings(
        input
            .vehicles
            .iter()
            .flat_map(|v| v.value("other_restrictions").split('|'))
            .map(str::to_string),
    )
    .join("|");
    let applications = gallery::dedupe_strings(input.vehicles.iter().map(describe_vehicle)).join("|");

    let mut record = Record::new()
        .with("manufacturer_item_number", extract_str(source, &["articleNumber"], ""))
        .with("article_id", article_id)
        .with("article_name", article_name)
        .with("manufacturer_id", extract_str(source, &["dataSupplierId"], ""))
        .with("manufacturer_name", extract_str(source, &["mfrName"], ""))
        .with("gtins", gtins)
        .with("category_hierarchy", input.category)
        .with("vehicle_types_found", vehicle_types.len().to_string())
        .with("vehicle_applications_count", input.vehicles.len().to_string())
        .with("vehicle_manufacturers", column("vehicle_mfr_name"))
        .with("vehicle_models", column("model_series_name"))
        .with("restriction_texts", restriction_texts)
        .with("vehicle_applications", applications)
        .with(RAW_ARTICLE_COLUMN, article.to_string());

    for (name, url) in gallery::image_size_columns(extract::list(article, "images")) {
        record.set(name, url);
    }

    record
}

/// `"mfr model type (from-to)"`, skipping empty parts.
fn describe_vehicle(vehicle: &Record) -> String {
    let name = ["vehicle_mfr_name", "model_series_name", "type_name"]
        .iter()
        .map(|c| vehicle.value(c))
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    let (from, to) = (vehicle.value("year_from"), vehicle.value("year_to"));
    if from.is_empty() && to.is_empty() {
        name
    } else {
        format!("{name} ({from}-{to})")
    }
}
