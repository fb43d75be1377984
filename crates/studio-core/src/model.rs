//! Domain models shared by the wizard, the state container and storage.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::image::{ImageRef, StoredImage};

/// What kind of subject is being dressed.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SubjectCategory {
    #[default]
    Person,
    Animal,
    Object,
}

/// Whether the applied item is worn clothing or an accessory.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ItemType {
    #[default]
    Clothing,
    Accessory,
}

/// One successful generation, kept in the history gallery.
///
/// Entries are immutable once created and only removed by explicit deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    pub id: String,
    #[serde(alias = "faceUrl")]
    pub subject_image: ImageRef,
    #[serde(alias = "clothUrl")]
    pub item_image: ImageRef,
    #[serde(alias = "resultUrl")]
    pub result_image: ImageRef,
    #[serde(with = "chrono::serde::ts_milliseconds", alias = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub category: SubjectCategory,
    #[serde(default)]
    pub item_type: ItemType,
}

impl HistoryItem {
    /// True when all three image references pass the shape check.
    pub fn is_plausible(&self) -> bool {
        self.subject_image.is_plausible()
            && self.item_image.is_plausible()
            && self.result_image.is_plausible()
    }
}

/// Custom subject uploads, one newest-first list per category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomUploadSet {
    by_category: BTreeMap<SubjectCategory, Vec<StoredImage>>,
}

impl CustomUploadSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, category: SubjectCategory) -> &[StoredImage] {
        self.by_category
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn get_mut(&mut self, category: SubjectCategory) -> &mut Vec<StoredImage> {
        self.by_category.entry(category).or_default()
    }

    pub fn set(&mut self, category: SubjectCategory, images: Vec<StoredImage>) {
        self.by_category.insert(category, images);
    }

    pub fn total_len(&self) -> usize {
        self.by_category.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::ImageId;
    use std::str::FromStr;

    #[test]
    fn test_category_wire_names() {
        let json = serde_json::to_string(&SubjectCategory::Animal).unwrap();
        assert_eq!(json, "\"animal\"");
        assert_eq!(SubjectCategory::from_str("OBJECT").unwrap(), SubjectCategory::Object);
        assert_eq!(ItemType::Accessory.to_string(), "accessory");
    }

    #[test]
    fn test_history_item_defaults_missing_enums() {
        let json = r#"{
            "id": "1700000000000",
            "subjectImage": "https://example.com/face.jpg",
            "itemImage": "https://example.com/cloth.jpg",
            "resultImage": "data:image/png;base64,AAAA",
            "createdAt": 1700000000000
        }"#;
        let item: HistoryItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.category, SubjectCategory::Person);
        assert_eq!(item.item_type, ItemType::Clothing);
        assert_eq!(item.created_at.timestamp_millis(), 1_700_000_000_000);
        assert!(item.is_plausible());
    }

    #[test]
    fn test_history_item_accepts_earlier_field_names() {
        let json = r#"{
            "id": "1",
            "faceUrl": "https://example.com/face.jpg",
            "clothUrl": "https://example.com/cloth.jpg",
            "resultUrl": "data:image/png;base64,AAAA",
            "timestamp": 1700000000000,
            "category": "object",
            "itemType": "accessory"
        }"#;
        let item: HistoryItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.subject_image.as_str(), "https://example.com/face.jpg");
        assert_eq!(item.category, SubjectCategory::Object);
        assert_eq!(item.item_type, ItemType::Accessory);
    }

    #[test]
    fn test_upload_set_serializes_as_category_map() {
        let mut uploads = CustomUploadSet::new();
        uploads
            .get_mut(SubjectCategory::Person)
            .push(StoredImage::with_id(ImageId::new("a"), "https://example.com/a.png"));

        let value = serde_json::to_value(&uploads).unwrap();
        assert_eq!(value["person"][0]["id"], "a");
        assert!(uploads.get(SubjectCategory::Animal).is_empty());
        assert_eq!(uploads.total_len(), 1);
    }
}
