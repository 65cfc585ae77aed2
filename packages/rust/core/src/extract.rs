//! Prioritized field extraction from loosely-shaped JSON payloads.
//!
//! The upstream API moves fields between nesting levels and renames them
//! across endpoint versions, so every "which key holds X" decision is a
//! [`FieldRule`]: an ordered candidate list plus an optional fallback.
//! The rules live in one table here so the fallback policy can be audited
//! and tested in isolation.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Field rules
// ---------------------------------------------------------------------------

/// What to try once every candidate key has missed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    /// Give up and return the default.
    None,
    /// Derive an identifier from a file name (image extension stripped),
    /// else from the last path segment of a URL (text before the first `.`).
    FileStem {
        filename_key: &'static str,
        url_key: &'static str,
    },
}

/// An output field and the source keys that may hold it, in priority order.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub field: &'static str,
    pub candidates: &'static [&'static str],
    pub fallback: Fallback,
}

impl FieldRule {
    const fn keys(field: &'static str, candidates: &'static [&'static str]) -> Self {
        Self {
            field,
            candidates,
            fallback: Fallback::None,
        }
    }
}

/// Document id of an image/document entry.
pub const DOCUMENT_ID: FieldRule = FieldRule {
    field: "doc_id",
    candidates: &["docId", "documentId", "id", "assetId", "imageId"],
    fallback: Fallback::FileStem {
        filename_key: "fileName",
        url_key: "imageURL50",
    },
};

/// File name of an image/document entry.
pub const FILENAME: FieldRule = FieldRule::keys("filename", &["fileName", "filename", "name"]);

/// Document type of an image/document entry.
pub const DOCUMENT_TYPE: FieldRule = FieldRule::keys(
    "doc_type",
    &["typeDescription", "docTypeName", "documentType", "type", "mimeType"],
);

/// URL of a PDF entry.
pub const PDF_URL: FieldRule = FieldRule::keys("pdf_url", &["url", "fileURL", "pdfURL"]);

/// Vehicle columns and where linkage details keep them.
pub const VEHICLE_RULES: &[FieldRule] = &[
    FieldRule::keys(
        "vehicle_mfr_name",
        &["manuDesc", "mfrName", "manufacturerName", "vehicleMfrName"],
    ),
    FieldRule::keys("model_series_name", &["modelDesc", "modelName", "modelSeriesName"]),
    FieldRule::keys(
        "type_name",
        &["carDesc", "typeName", "vehicleTypeDescription", "description"],
    ),
    FieldRule::keys(
        "year_from",
        &["yearOfConstructionFrom", "yearOfConstrFrom", "constructionYearFrom"],
    ),
    FieldRule::keys(
        "year_to",
        &["yearOfConstructionTo", "yearOfConstrTo", "constructionYearTo"],
    ),
    FieldRule::keys("engine_cc", &["cylinderCapacity", "cylinderCapacityCcm", "ccmTech"]),
    FieldRule::keys("power_hp", &["powerHpFrom", "powerHP", "powerHp"]),
    FieldRule::keys("fuel_type", &["fuelType", "fuelTypeDescription"]),
    FieldRule::keys("body_style", &["constructionType", "bodyType", "bodyStyle"]),
    FieldRule::keys("drive_type", &["impulsionType", "driveType"]),
    FieldRule::keys("kba_numbers", &["kbaNumbers", "kbaNumber"]),
    FieldRule::keys("engine_code", &["motorCodes", "engineCodes", "motorCode", "engineCode"]),
];

/// Brand columns and where brand info keeps them.
pub const BRAND_RULES: &[FieldRule] = &[
    FieldRule::keys("www_url", &["website", "wwwURL", "wwwUrl"]),
    FieldRule::keys("email", &["email"]),
    FieldRule::keys("phone", &["phone"]),
    FieldRule::keys("fax", &["fax"]),
    FieldRule::keys("status", &["status", "brandStatus"]),
    FieldRule::keys("status_badge_url", &["statusBadgeUrl", "statusBadgeURL"]),
    FieldRule::keys("zip_country_iso", &["countryIso", "zipCountryIso"]),
    FieldRule::keys("city", &["city"]),
    FieldRule::keys("zip", &["zip"]),
    FieldRule::keys("street", &["street"]),
    FieldRule::keys("name", &["companyName", "name"]),
    FieldRule::keys("name2", &["companyName2", "name2"]),
];

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Present and non-empty for strings; present (non-null) for everything else.
pub fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

/// The value of the first candidate key that is present in `source`.
pub fn extract<'a, S: AsRef<str>>(source: &'a Map<String, Value>, candidates: &[S]) -> Option<&'a Value> {
    candidates
        .iter()
        .filter_map(|key| source.get(key.as_ref()))
        .find(|value| is_present(value))
}

/// Like [`extract`], stringified, with `default` when nothing matches.
pub fn extract_str<S: AsRef<str>>(source: &Map<String, Value>, candidates: &[S], default: &str) -> String {
    extract(source, candidates)
        .map(scalar_to_string)
        .unwrap_or_else(|| default.to_string())
}

/// Apply a [`FieldRule`], including its fallback. Returns `""` when exhausted.
pub fn extract_field(source: &Map<String, Value>, rule: &FieldRule) -> String {
    if let Some(value) = extract(source, rule.candidates) {
        return scalar_to_string(value);
    }

    match rule.fallback {
        Fallback::None => String::new(),
        Fallback::FileStem {
            filename_key,
            url_key,
        } => {
            if let Some(name) = source.get(filename_key).and_then(Value::as_str) {
                if !name.is_empty() {
                    return strip_image_extension(name).to_string();
                }
            }
            source
                .get(url_key)
                .and_then(Value::as_str)
                .map(stem_from_url)
                .unwrap_or_default()
        }
    }
}

/// Boolean flag rendered as `"true"`/`"false"`; absent or null is `"false"`.
pub fn flag(source: &Map<String, Value>, key: &str) -> String {
    match source.get(key) {
        None | Some(Value::Null) => "false".to_string(),
        Some(value) => scalar_to_string(value).to_lowercase(),
    }
}

/// Render a JSON value as a flat cell value.
///
/// Strings are verbatim, numbers keep their JSON text, booleans become
/// `true`/`false`, null is empty. Arrays of scalars are `|`-joined; anything
/// else falls back to compact JSON.
pub fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) if items.iter().all(|v| !v.is_array() && !v.is_object()) => items
            .iter()
            .filter(|v| is_present(v))
            .map(scalar_to_string)
            .collect::<Vec<_>>()
            .join("|"),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Payload navigation
// ---------------------------------------------------------------------------

static EMPTY_OBJECT: LazyLock<Map<String, Value>> = LazyLock::new(Map::new);

/// A shared empty object.
pub fn empty_object<'a>() -> &'a Map<String, Value> {
    &EMPTY_OBJECT
}

/// Borrow `value` as an object, or an empty one.
pub fn object(value: &Value) -> &Map<String, Value> {
    value.as_object().unwrap_or_else(empty_object)
}

/// Borrow `value[key]` as a list of values, or an empty slice.
pub fn list<'a>(value: &'a Value, key: &str) -> &'a [Value] {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// The record list of a typical response: `data.array`, else top-level `array`.
pub fn response_rows(response: &Value) -> &[Value] {
    match response.get("data") {
        Some(data) if data.get("array").is_some() => list(data, "array"),
        _ => list(response, "array"),
    }
}

// ---------------------------------------------------------------------------
// Fallback helpers
// ---------------------------------------------------------------------------

/// Matches a trailing `.jpg`, `.jpeg`, or `.png`, any case.
static IMAGE_EXT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.(jpe?g|png)$").expect("image extension regex"));

/// Strip a trailing image extension from a file name.
pub fn strip_image_extension(name: &str) -> &str {
    match IMAGE_EXT_RE.find(name) {
        Some(m) => &name[..m.start()],
        None => name,
    }
}

/// Last path segment of a URL, up to its first `.`. Empty if there is no `/`.
pub fn stem_from_url(url: &str) -> String {
    match url.rsplit_once('/') {
        Some((_, segment)) => segment.split('.').next().unwrap_or("").to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> Map<String, Value> {
        value.as_object().cloned().expect("object")
    }

    #[test]
    fn last_candidate_wins_when_it_is_the_only_one() {
        let source = obj(json!({ "mimeType": "image/jpeg" }));
        assert_eq!(
            extract_str(&source, DOCUMENT_TYPE.candidates, ""),
            "image/jpeg"
        );
    }

    #[test]
    fn empty_source_returns_default() {
        let source = Map::new();
        assert_eq!(extract_str(&source, &["a", "b"], "n/a"), "n/a");
        assert!(extract(&source, &["a"]).is_none());
    }

    #[test]
    fn priority_order_is_respected() {
        let source = obj(json!({ "id": 7, "docId": "D-1" }));
        assert_eq!(extract_field(&source, &DOCUMENT_ID), "D-1");
    }

    #[test]
    fn empty_strings_and_nulls_are_skipped_but_zero_is_present() {
        let source = obj(json!({ "docId": "", "documentId": null, "id": 0 }));
        assert_eq!(extract_field(&source, &DOCUMENT_ID), "0");
    }

    #[test]
    fn document_id_falls_back_to_filename_stem() {
        let source = obj(json!({ "fileName": "BRAKE_PAD.JPG" }));
        assert_eq!(extract_field(&source, &DOCUMENT_ID), "BRAKE_PAD");

        let source = obj(json!({ "fileName": "drawing.v2.jpeg" }));
        assert_eq!(extract_field(&source, &DOCUMENT_ID), "drawing.v2");

        let source = obj(json!({ "fileName": "sheet.pdf" }));
        assert_eq!(extract_field(&source, &DOCUMENT_ID), "sheet.pdf");
    }

    #[test]
    fn document_id_falls_back_to_url_segment() {
        let source = obj(json!({ "imageURL50": "https://cdn.example.com/img/50/1234.abc.jpg" }));
        assert_eq!(extract_field(&source, &DOCUMENT_ID), "1234");

        let source = obj(json!({ "imageURL50": "no-slash.jpg" }));
        assert_eq!(extract_field(&source, &DOCUMENT_ID), "");
    }

    #[test]
    fn rules_without_fallback_return_empty() {
        let source = obj(json!({ "other": "x" }));
        assert_eq!(extract_field(&source, &FILENAME), "");
    }

    #[test]
    fn flags_render_lowercase_with_false_default() {
        let source = obj(json!({ "isAccessory": true, "isRemanufacturedPart": "True", "x": null }));
        assert_eq!(flag(&source, "isAccessory"), "true");
        assert_eq!(flag(&source, "isRemanufacturedPart"), "true");
        assert_eq!(flag(&source, "x"), "false");
        assert_eq!(flag(&source, "missing"), "false");
    }

    #[test]
    fn scalars_stringify_predictably() {
        assert_eq!(scalar_to_string(&json!(355)), "355");
        assert_eq!(scalar_to_string(&json!(1.5)), "1.5");
        assert_eq!(scalar_to_string(&json!(false)), "false");
        assert_eq!(scalar_to_string(&json!(null)), "");
        assert_eq!(scalar_to_string(&json!(["4711", "", 815])), "4711|815");
        assert_eq!(scalar_to_string(&json!({ "a": 1 })), r#"{"a":1}"#);
    }

    #[test]
    fn response_rows_prefers_data_array() {
        let nested = json!({ "data": { "array": [{ "a": 1 }, { "a": 2 }] } });
        assert_eq!(response_rows(&nested).len(), 2);

        let flat = json!({ "array": [{ "a": 1 }] });
        assert_eq!(response_rows(&flat).len(), 1);

        assert!(response_rows(&json!({})).is_empty());
        assert!(response_rows(&json!({ "data": {} })).is_empty());
    }

    #[test]
    fn stem_and_extension_helpers() {
        assert_eq!(strip_image_extension("a.PNG"), "a");
        assert_eq!(strip_image_extension("a.png.txt"), "a.png.txt");
        assert_eq!(stem_from_url("https://x/y/z.tar.gz"), "z");
    }
}
