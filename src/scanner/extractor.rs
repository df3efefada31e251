//! Hit filtering by content type

use serde_json::Value;

use super::record_set::RecordSet;
use crate::core::fetcher::PageResult;

/// A hit is kept when its mimetype contains any of these (case-sensitive)
pub const RETAINED_MIME_MARKERS: &[&str] = &["text/plain", "key", "zip", "gzip", "tar"];

/// Whether a hit with this mimetype is worth recording
///
/// A missing mimetype is kept: the API leaves it unset for files it
/// could not sniff, which includes most raw key material.
pub fn is_retained_mimetype(mimetype: Option<&str>) -> bool {
    match mimetype {
        None => true,
        Some(m) => RETAINED_MIME_MARKERS.iter().any(|marker| m.contains(marker)),
    }
}

fn hit_mimetype(hit: &Value) -> Option<Option<&str>> {
    match hit.get("mimetype") {
        None | Some(Value::Null) => Some(None),
        Some(Value::String(m)) => Some(Some(m.as_str())),
        Some(_) => None,
    }
}

/// Extract the records worth keeping from one page
///
/// Returns `None` when the page has no hits at all, which ends pagination
/// for the pattern. A page whose hits were all filtered out yields an empty
/// set instead.
pub fn extract_records(page: &PageResult) -> Option<RecordSet> {
    let hits = page.hits();
    if hits.is_empty() {
        return None;
    }

    let mut records = RecordSet::new();
    for hit in hits {
        let Some(cid) = hit.get("hash").and_then(Value::as_str) else {
            continue;
        };
        match hit_mimetype(hit) {
            Some(mimetype) if is_retained_mimetype(mimetype) => {
                records.insert(cid.to_string(), hit.clone());
            }
            _ => {}
        }
    }

    Some(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn page(hits: Value) -> PageResult {
        serde_json::from_value(json!({ "hits": hits, "page_count": 1 })).unwrap()
    }

    #[test]
    fn test_mimetype_retention() {
        assert!(is_retained_mimetype(None));
        assert!(is_retained_mimetype(Some("text/plain; charset=utf-8")));
        assert!(is_retained_mimetype(Some("application/gzip")));
        assert!(is_retained_mimetype(Some("application/x-tar")));
        assert!(is_retained_mimetype(Some("application/zip")));
        assert!(is_retained_mimetype(Some("application/pgp-keys")));
        assert!(!is_retained_mimetype(Some("image/png")));
        assert!(!is_retained_mimetype(Some("text/html")));
        // case-sensitive
        assert!(!is_retained_mimetype(Some("TEXT/PLAIN")));
    }

    #[test]
    fn test_empty_page_signals_exhaustion() {
        assert!(extract_records(&page(json!([]))).is_none());
        assert!(extract_records(&PageResult::default()).is_none());
    }

    #[test]
    fn test_filters_hits_by_mimetype() {
        let records = extract_records(&page(json!([
            {"hash": "keep-text", "mimetype": "text/plain"},
            {"hash": "drop-image", "mimetype": "image/png"},
            {"hash": "keep-null", "mimetype": null},
            {"hash": "keep-missing"},
            {"hash": "drop-number", "mimetype": 7}
        ])))
        .unwrap();

        assert_eq!(
            records.cids().collect::<Vec<_>>(),
            vec!["keep-text", "keep-null", "keep-missing"]
        );
    }

    #[test]
    fn test_all_filtered_is_not_exhaustion() {
        let records = extract_records(&page(json!([
            {"hash": "a", "mimetype": "video/mp4"}
        ])))
        .unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_keeps_full_hit_and_last_duplicate() {
        let records = extract_records(&page(json!([
            {"hash": "dup", "mimetype": "text/plain", "score": 1.0},
            {"hash": "dup", "mimetype": "text/plain", "score": 2.5, "size": 1704}
        ])))
        .unwrap();

        assert_eq!(records.len(), 1);
        let record = records.get("dup").unwrap();
        assert_eq!(record["score"], 2.5);
        assert_eq!(record["size"], 1704);
    }

    #[test]
    fn test_skips_hits_without_hash() {
        let records = extract_records(&page(json!([
            {"mimetype": "text/plain"},
            {"hash": 12, "mimetype": "text/plain"},
            {"hash": "ok", "mimetype": "text/plain"}
        ])))
        .unwrap();
        assert_eq!(records.cids().collect::<Vec<_>>(), vec!["ok"]);
    }
}
