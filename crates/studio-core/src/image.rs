//! Image references and stored images.
//!
//! An [`ImageRef`] is either an embedded data URI (uploads and generated
//! results) or a remote URL (presets). Images kept in collections are wrapped
//! in [`StoredImage`] so selection and deletion compare stable ids instead of
//! the raw strings.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Shortest string accepted as an image reference when reloading stored data.
const MIN_PLAUSIBLE_LEN: usize = 5;

/// A reference to image content: `data:` URI or remote URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(String);

/// Borrowed view of a parsed `data:<mime>;base64,<payload>` URI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataUri<'a> {
    pub mime_type: &'a str,
    pub data: &'a str,
}

impl ImageRef {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Builds a data URI from a mime type and base64 payload.
    pub fn from_base64(mime_type: &str, data: &str) -> Self {
        Self(format!("data:{mime_type};base64,{data}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Minimal shape check applied to persisted references.
    pub fn is_plausible(&self) -> bool {
        self.0.len() > MIN_PLAUSIBLE_LEN
    }

    pub fn is_data_uri(&self) -> bool {
        self.0.starts_with("data:")
    }

    pub fn is_remote(&self) -> bool {
        self.0.starts_with("https://") || self.0.starts_with("http://")
    }

    /// Splits a base64 data URI into mime type and payload.
    ///
    /// Returns `None` for remote URLs and for data URIs that are not base64.
    pub fn parse_data_uri(&self) -> Option<DataUri<'_>> {
        let rest = self.0.strip_prefix("data:")?;
        let (header, data) = rest.split_once(',')?;
        let mime_type = header.strip_suffix(";base64")?;
        Some(DataUri { mime_type, data })
    }

    /// Short form for logs and listings; data URIs are not printed in full.
    pub fn summary(&self) -> String {
        match self.parse_data_uri() {
            Some(uri) => format!("<{} {} bytes>", uri.mime_type, uri.data.len()),
            None => self.0.clone(),
        }
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ImageRef {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ImageRef {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Stable identifier of a stored image.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageId(String);

impl ImageId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// A fresh random id for a new upload or generated image.
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Content-derived id, stable across reloads of the same reference.
    pub fn from_content(source: &ImageRef) -> Self {
        Self(Uuid::new_v5(&Uuid::NAMESPACE_URL, source.as_str().as_bytes()).to_string())
    }

    /// Id of a legacy entry at `index` of a persisted list. Identical
    /// references at different positions get different ids.
    pub fn from_position(index: usize, source: &ImageRef) -> Self {
        let name = format!("{index}:{}", source.as_str());
        Self(Uuid::new_v5(&Uuid::NAMESPACE_URL, name.as_bytes()).to_string())
    }

    /// Deterministic id of a built-in preset.
    pub fn preset(collection: &str, index: usize) -> Self {
        Self(format!("preset-{collection}-{index}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_preset(&self) -> bool {
        self.0.starts_with("preset-")
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ImageId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// An image held in a collection, with its stable id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredImage {
    pub id: ImageId,
    pub source: ImageRef,
}

impl StoredImage {
    /// Wraps a new reference with a fresh random id.
    pub fn new(source: impl Into<ImageRef>) -> Self {
        Self {
            id: ImageId::random(),
            source: source.into(),
        }
    }

    /// Wraps a reference persisted without an id.
    pub fn from_legacy(source: ImageRef) -> Self {
        Self {
            id: ImageId::from_content(&source),
            source,
        }
    }

    /// Wraps a reference found without an id at `index` of a persisted list.
    pub fn from_legacy_at(index: usize, source: ImageRef) -> Self {
        Self {
            id: ImageId::from_position(index, &source),
            source,
        }
    }

    pub fn with_id(id: ImageId, source: impl Into<ImageRef>) -> Self {
        Self {
            id,
            source: source.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plausibility() {
        assert!(!ImageRef::new("").is_plausible());
        assert!(!ImageRef::new("abcde").is_plausible());
        assert!(ImageRef::new("abcdef").is_plausible());
    }

    #[test]
    fn test_parse_data_uri() {
        let image = ImageRef::from_base64("image/png", "iVBORw0KGgo=");
        let uri = image.parse_data_uri().unwrap();
        assert_eq!(uri.mime_type, "image/png");
        assert_eq!(uri.data, "iVBORw0KGgo=");
        assert!(image.is_data_uri());
        assert!(!image.is_remote());
    }

    #[test]
    fn test_parse_remote_url_is_none() {
        let image = ImageRef::new("https://images.example.com/a.jpg");
        assert!(image.parse_data_uri().is_none());
        assert!(image.is_remote());
    }

    #[test]
    fn test_non_base64_data_uri_is_none() {
        let image = ImageRef::new("data:text/plain,hello");
        assert!(image.parse_data_uri().is_none());
    }

    #[test]
    fn test_legacy_ids_are_stable() {
        let a = StoredImage::from_legacy(ImageRef::new("data:image/png;base64,AAAA"));
        let b = StoredImage::from_legacy(ImageRef::new("data:image/png;base64,AAAA"));
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn test_positional_ids_differ_for_same_bytes() {
        let source = ImageRef::new("data:image/png;base64,AAAA");
        let first = StoredImage::from_legacy_at(0, source.clone());
        let second = StoredImage::from_legacy_at(1, source.clone());
        assert_ne!(first.id, second.id);
        assert_eq!(first.id, StoredImage::from_legacy_at(0, source).id);
    }

    #[test]
    fn test_new_ids_differ_for_same_bytes() {
        let a = StoredImage::new("data:image/png;base64,AAAA");
        let b = StoredImage::new("data:image/png;base64,AAAA");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_summary_hides_payload() {
        let image = ImageRef::from_base64("image/jpeg", "/9j/AAAA");
        assert_eq!(image.summary(), "<image/jpeg 8 bytes>");
    }
}
