//! Boundary to the remote image-generation service.

use async_trait::async_trait;

use crate::error::Result;
use crate::image::ImageRef;
use crate::model::{ItemType, SubjectCategory};
use crate::variation::Variation;

/// An image payload ready to be sent inline: mime type plus base64 data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: String,
    pub data: String,
}

impl InlineImage {
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Wraps bare base64, sniffing the mime type from the payload prefix.
    pub fn from_base64(data: impl Into<String>) -> Self {
        let data = data.into();
        let mime_type = sniff_mime_type(&data);
        Self {
            mime_type: mime_type.to_string(),
            data,
        }
    }

    pub fn to_image_ref(&self) -> ImageRef {
        ImageRef::from_base64(&self.mime_type, &self.data)
    }
}

/// Guesses the mime type of base64 image data; JPEG has a fixed prefix,
/// everything else is sent as PNG.
pub fn sniff_mime_type(base64: &str) -> &'static str {
    if base64.starts_with("/9j/") {
        "image/jpeg"
    } else {
        "image/png"
    }
}

/// Inputs of a subject + item composite.
#[derive(Debug, Clone)]
pub struct TryOnRequest {
    pub subject: InlineImage,
    pub item: InlineImage,
    pub category: SubjectCategory,
    pub item_type: ItemType,
    pub variation: Variation,
}

/// Inputs of a three-view turnaround sheet.
#[derive(Debug, Clone)]
pub struct TurnaroundRequest {
    pub subject: InlineImage,
    pub item: InlineImage,
    pub category: SubjectCategory,
}

/// Remote generative-image operations. Each returns a data URI.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Text prompt to a single isolated item image.
    async fn generate_item(&self, description: &str) -> Result<ImageRef>;

    /// Subject and item to one composited image.
    async fn generate_try_on(&self, request: TryOnRequest) -> Result<ImageRef>;

    /// Subject and item to one wide front/side/back sprite.
    async fn generate_turnaround(&self, request: TurnaroundRequest) -> Result<ImageRef>;
}

/// Materialises an image reference into a transportable payload.
#[async_trait]
pub trait ImageResolver: Send + Sync {
    async fn resolve(&self, image: &ImageRef) -> Result<InlineImage>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_mime_type() {
        assert_eq!(sniff_mime_type("/9j/4AAQSkZJRg"), "image/jpeg");
        assert_eq!(sniff_mime_type("iVBORw0KGgo"), "image/png");
    }

    #[test]
    fn test_inline_image_to_ref() {
        let inline = InlineImage::from_base64("/9j/AAAA");
        assert_eq!(inline.to_image_ref().as_str(), "data:image/jpeg;base64,/9j/AAAA");
    }
}
