//! Validation of persisted collections on load.
//!
//! Persisted data may come from older versions or be hand-edited. Anything
//! that does not look like a collection resets to empty; inside a collection,
//! entries that fail the image-reference shape check are dropped.

use std::collections::HashSet;

use serde_json::Value;
use strum::IntoEnumIterator;

use crate::image::{ImageId, ImageRef, StoredImage};
use crate::model::{CustomUploadSet, HistoryItem, SubjectCategory};

fn stored_image(index: usize, entry: &Value) -> Option<StoredImage> {
    match entry {
        // Bare references were written before images carried ids.
        Value::String(source) => {
            let source = ImageRef::new(source.as_str());
            source
                .is_plausible()
                .then(|| StoredImage::from_legacy_at(index, source))
        }
        Value::Object(map) => {
            let source = ImageRef::new(map.get("source")?.as_str()?);
            if !source.is_plausible() {
                return None;
            }
            match map.get("id").and_then(Value::as_str) {
                Some(id) if !id.is_empty() => Some(StoredImage::with_id(ImageId::new(id), source)),
                _ => Some(StoredImage::from_legacy_at(index, source)),
            }
        }
        _ => None,
    }
}

fn has_explicit_id(entry: &Value) -> bool {
    entry
        .get("id")
        .and_then(Value::as_str)
        .is_some_and(|id| !id.is_empty())
}

/// Plausible images from a persisted array. Entries carrying an explicit id
/// keep only their first occurrence; everything else is kept as is.
pub fn image_list(value: &Value) -> Vec<StoredImage> {
    let Some(entries) = value.as_array() else {
        return Vec::new();
    };
    let mut seen = HashSet::new();
    entries
        .iter()
        .enumerate()
        .filter_map(|(index, entry)| {
            let image = stored_image(index, entry)?;
            if has_explicit_id(entry) && !seen.insert(image.id.clone()) {
                return None;
            }
            Some(image)
        })
        .collect()
}

/// Per-category upload lists from a persisted object.
pub fn upload_set(value: &Value) -> CustomUploadSet {
    let mut uploads = CustomUploadSet::new();
    let Some(map) = value.as_object() else {
        return uploads;
    };
    for category in SubjectCategory::iter() {
        let images = map
            .get(&category.to_string())
            .map(image_list)
            .unwrap_or_default();
        uploads.set(category, images);
    }
    uploads
}

/// History entries that deserialize and reference plausible images.
pub fn history(value: &Value) -> Vec<HistoryItem> {
    let Some(entries) = value.as_array() else {
        return Vec::new();
    };
    entries
        .iter()
        .filter_map(|entry| serde_json::from_value::<HistoryItem>(entry.clone()).ok())
        .filter(HistoryItem::is_plausible)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_image_list_filters_implausible_entries() {
        let value = json!([
            "https://example.com/a.png",
            "",
            "abc",
            42,
            null,
            {"id": "x1", "source": "data:image/png;base64,AAAA"},
            {"id": "x2", "source": "tiny"},
            {"source": "https://example.com/b.png"}
        ]);
        let images = image_list(&value);
        let sources: Vec<_> = images.iter().map(|image| image.source.as_str()).collect();
        assert_eq!(
            sources,
            vec![
                "https://example.com/a.png",
                "data:image/png;base64,AAAA",
                "https://example.com/b.png"
            ]
        );
        assert_eq!(images[1].id.as_str(), "x1");
    }

    #[test]
    fn test_image_list_non_array_is_empty() {
        assert!(image_list(&json!({"a": 1})).is_empty());
        assert!(image_list(&json!("https://example.com/a.png")).is_empty());
    }

    #[test]
    fn test_identical_legacy_entries_both_survive() {
        let value = json!(["data:image/png;base64,SAME", "data:image/png;base64,SAME"]);
        let images = image_list(&value);
        assert_eq!(images.len(), 2);
        assert_ne!(images[0].id, images[1].id);
        assert_eq!(images[0].source, images[1].source);
    }

    #[test]
    fn test_repeated_explicit_ids_keep_first() {
        let value = json!([
            {"id": "x1", "source": "https://example.com/a.png"},
            {"id": "x1", "source": "https://example.com/b.png"},
            {"source": "https://example.com/a.png"}
        ]);
        let images = image_list(&value);
        let sources: Vec<_> = images.iter().map(|image| image.source.as_str()).collect();
        assert_eq!(
            sources,
            vec!["https://example.com/a.png", "https://example.com/a.png"]
        );
        assert_eq!(images[0].id.as_str(), "x1");
    }

    #[test]
    fn test_upload_set_partial_categories() {
        let value = json!({
            "person": ["https://example.com/p.png"],
            "animal": "not-an-array"
        });
        let uploads = upload_set(&value);
        assert_eq!(uploads.get(SubjectCategory::Person).len(), 1);
        assert!(uploads.get(SubjectCategory::Animal).is_empty());
        assert!(uploads.get(SubjectCategory::Object).is_empty());
    }

    #[test]
    fn test_upload_set_from_array_is_empty() {
        assert_eq!(upload_set(&json!([1, 2])).total_len(), 0);
    }

    #[test]
    fn test_history_drops_broken_entries() {
        let value = json!([
            {
                "id": "1",
                "subjectImage": "https://example.com/face.jpg",
                "itemImage": "https://example.com/coat.jpg",
                "resultImage": "data:image/png;base64,AAAA",
                "createdAt": 1700000000000i64
            },
            {"id": "2"},
            {
                "id": "3",
                "subjectImage": "x",
                "itemImage": "https://example.com/coat.jpg",
                "resultImage": "data:image/png;base64,AAAA",
                "createdAt": 1700000000000i64
            }
        ]);
        let items = history(&value);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "1");
    }
}
