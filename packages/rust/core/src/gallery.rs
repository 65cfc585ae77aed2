//! Image and document list deduplication.
//!
//! An article's `images` list mixes primary thumbnails, extra renditions,
//! and attached documents under inconsistent keys. [`dedupe`] flattens it
//! into first-seen-ordered, duplicate-free lists.

use std::collections::{BTreeMap, HashSet};

use serde_json::Value;

use crate::extract::{self, DOCUMENT_ID, DOCUMENT_TYPE, FILENAME};

/// Key prefix of every image rendition URL.
const IMAGE_URL_PREFIX: &str = "imageURL";

/// Pixel sizes of the primary image columns, in column order.
pub const PRIMARY_SIZES: [u32; 5] = [50, 100, 200, 400, 800];

/// Flattened media of one article.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaSummary {
    pub doc_ids: Vec<String>,
    pub filenames: Vec<String>,
    pub doc_types: Vec<String>,
    pub gallery_urls: Vec<String>,
    pub pdf_urls: Vec<String>,
}

/// Insertion-ordered list that ignores empty and repeated values.
#[derive(Default)]
struct OrderedSet {
    seen: HashSet<String>,
    items: Vec<String>,
}

impl OrderedSet {
    fn push(&mut self, value: String) {
        if !value.is_empty() && self.seen.insert(value.clone()) {
            self.items.push(value);
        }
    }

    fn into_vec(self) -> Vec<String> {
        self.items
    }
}

/// Collect document ids, filenames, types, gallery URLs, and PDF URLs.
///
/// Gallery URLs come from `imageURL*` keys other than the five primary
/// sizes, in every entry, whose value is not one of `primary_urls`. A value is a PDF when it contains `.pdf` or its key
/// contains `pdf` (both case-insensitive). Non-object entries are ignored.
pub fn dedupe(entries: &[Value], primary_urls: &HashSet<String>) -> MediaSummary {
    let mut doc_ids = OrderedSet::default();
    let mut filenames = OrderedSet::default();
    let mut doc_types = OrderedSet::default();
    let mut gallery = OrderedSet::default();
    let mut pdfs = OrderedSet::default();

    for entry in entries.iter().filter_map(Value::as_object) {
        doc_ids.push(extract::extract_field(entry, &DOCUMENT_ID));
        filenames.push(extract::extract_field(entry, &FILENAME));
        doc_types.push(extract::extract_field(entry, &DOCUMENT_TYPE));

        for (key, value) in entry {
            let Some(url) = value.as_str() else { continue };

            if is_gallery_key(key) && !primary_urls.contains(url) {
                gallery.push(url.to_string());
            }
            if url.to_lowercase().contains(".pdf") || key.to_lowercase().contains("pdf") {
                pdfs.push(url.to_string());
            }
        }
    }

    MediaSummary {
        doc_ids: doc_ids.into_vec(),
        filenames: filenames.into_vec(),
        doc_types: doc_types.into_vec(),
        gallery_urls: gallery.into_vec(),
        pdf_urls: pdfs.into_vec(),
    }
}

/// An `imageURL*` key that is not one of the primary sizes.
fn is_gallery_key(key: &str) -> bool {
    key.strip_prefix(IMAGE_URL_PREFIX).is_some_and(|size| {
        !PRIMARY_SIZES
            .iter()
            .any(|primary| size == primary.to_string())
    })
}

/// The five primary URLs (`imageURL50` .. `imageURL800`) of the first image.
pub fn primary_image_urls(images: &[Value]) -> [String; 5] {
    let first = images.first().map(extract::object);
    PRIMARY_SIZES.map(|size| {
        first
            .and_then(|image| image.get(&format!("{IMAGE_URL_PREFIX}{size}")))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    })
}

/// Every `imageURL<size>` of the first image, keyed `image_<size>px`.
pub fn image_size_columns(images: &[Value]) -> BTreeMap<String, String> {
    let Some(first) = images.first().and_then(Value::as_object) else {
        return BTreeMap::new();
    };

    first
        .iter()
        .filter_map(|(key, value)| {
            let size = key.strip_prefix(IMAGE_URL_PREFIX)?;
            let url = value.as_str().filter(|url| !url.is_empty())?;
            Some((format!("image_{size}px"), url.to_string()))
        })
        .collect()
}

/// Order-preserving dedupe of a list of strings, dropping empties.
pub fn dedupe_strings<I>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut set = OrderedSet::default();
    for value in values {
        set.push(value);
    }
    set.into_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entries() -> Vec<Value> {
        vec![
            json!({
                "fileName": "PAD_1.JPG",
                "typeDescription": "Picture",
                "imageURL50": "https://cdn/50/PAD_1.JPG",
                "imageURL100": "https://cdn/100/PAD_1.JPG",
                "imageURL1600": "https://cdn/1600/PAD_1.JPG"
            }),
            json!({
                "fileName": "PAD_2.jpg",
                "typeDescription": "Picture",
                "imageURL50": "https://cdn/50/PAD_2.jpg",
                "imageURL1600": "https://cdn/1600/PAD_1.JPG"
            }),
            json!({
                "docId": "D9",
                "fileName": "manual.pdf",
                "mimeType": "application/pdf",
                "documentUrl": "https://cdn/docs/MANUAL.PDF",
                "pdfLink": "https://cdn/docs/manual"
            }),
            json!("not an object"),
        ]
    }

    fn primary() -> HashSet<String> {
        primary_image_urls(&entries())
            .into_iter()
            .filter(|url| !url.is_empty())
            .collect()
    }

    #[test]
    fn collects_first_seen_lists() {
        let media = dedupe(&entries(), &primary());

        assert_eq!(media.doc_ids, vec!["PAD_1", "PAD_2", "D9"]);
        assert_eq!(media.filenames, vec!["PAD_1.JPG", "PAD_2.jpg", "manual.pdf"]);
        assert_eq!(media.doc_types, vec!["Picture", "application/pdf"]);
        assert_eq!(media.gallery_urls, vec!["https://cdn/1600/PAD_1.JPG"]);
        assert_eq!(
            media.pdf_urls,
            vec!["manual.pdf", "https://cdn/docs/MANUAL.PDF", "https://cdn/docs/manual"]
        );
    }

    #[test]
    fn output_excludes_primary_and_duplicates() {
        let primary = primary();
        let media = dedupe(&entries(), &primary);

        for url in &media.gallery_urls {
            assert!(!primary.contains(url));
        }
        let unique: HashSet<_> = media.gallery_urls.iter().collect();
        assert_eq!(unique.len(), media.gallery_urls.len());

        let input_len = entries().len();
        assert!(media.doc_ids.len() <= input_len);
        assert!(media.filenames.len() <= input_len);
        assert!(media.doc_types.len() <= input_len);
        assert!(!media.doc_ids.iter().any(String::is_empty));
    }

    #[test]
    fn primary_size_keys_never_reach_the_gallery() {
        let images = vec![
            json!({ "imageURL50": "a50", "imageURL1600": "a1600" }),
            json!({ "imageURL50": "b50", "imageURL100": "b100", "imageURL3200": "b3200" }),
        ];
        let primary: HashSet<String> = primary_image_urls(&images)
            .into_iter()
            .filter(|url| !url.is_empty())
            .collect();

        let media = dedupe(&images, &primary);
        assert_eq!(media.gallery_urls, vec!["a1600", "b3200"]);

        // Value exclusion still applies to non-primary keys.
        let claimed = HashSet::from(["a1600".to_string()]);
        assert_eq!(dedupe(&images, &claimed).gallery_urls, vec!["b3200"]);
    }

    #[test]
    fn dedupe_is_idempotent() {
        let primary = primary();
        assert_eq!(dedupe(&entries(), &primary), dedupe(&entries(), &primary));
    }

    #[test]
    fn empty_input_gives_empty_summary() {
        assert_eq!(dedupe(&[], &HashSet::new()), MediaSummary::default());
        assert_eq!(primary_image_urls(&[]), <[String; 5]>::default());
        assert!(image_size_columns(&[]).is_empty());
    }

    #[test]
    fn primary_urls_take_fixed_sizes_from_first_image() {
        let urls = primary_image_urls(&entries());
        assert_eq!(urls[0], "https://cdn/50/PAD_1.JPG");
        assert_eq!(urls[1], "https://cdn/100/PAD_1.JPG");
        assert_eq!(urls[2], "");
        assert_eq!(urls[4], "");
    }

    #[test]
    fn size_columns_cover_every_rendition() {
        let columns = image_size_columns(&entries());
        let keys: Vec<_> = columns.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["image_100px", "image_1600px", "image_50px"]);
    }

    #[test]
    fn dedupe_strings_keeps_order() {
        let values = ["b", "a", "", "b", "c"].map(String::from);
        assert_eq!(dedupe_strings(values), vec!["b", "a", "c"]);
    }
}
