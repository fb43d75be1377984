//! Turns image references into inline payloads for the generation service.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use reqwest::Client;
use studio_core::error::{Result, StudioError};
use studio_core::generation::{ImageResolver, InlineImage};
use studio_core::image::ImageRef;

/// Resolves data URIs locally and downloads remote URLs.
#[derive(Clone, Default)]
pub struct HttpImageResolver {
    client: Client,
}

impl HttpImageResolver {
    pub fn new() -> Self {
        Self::default()
    }

    async fn download(&self, url: &str) -> Result<InlineImage> {
        tracing::debug!("[HttpImageResolver] Downloading {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| StudioError::image_fetch(url, err.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StudioError::image_fetch(url, format!("HTTP {}", status)));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.split(';').next().unwrap_or(value).trim().to_string())
            .filter(|value| value.starts_with("image/"));

        let bytes = response
            .bytes()
            .await
            .map_err(|err| StudioError::image_fetch(url, err.without_url().to_string()))?;
        if bytes.is_empty() {
            return Err(StudioError::image_fetch(url, "empty response body"));
        }

        let data = BASE64_STANDARD.encode(&bytes);
        Ok(match content_type {
            Some(mime_type) => InlineImage::new(mime_type, data),
            None => InlineImage::from_base64(data),
        })
    }
}

/// Resolves references that need no network access.
///
/// Returns `Ok(None)` for remote URLs.
fn resolve_local(image: &ImageRef) -> Result<Option<InlineImage>> {
    if image.is_remote() {
        return Ok(None);
    }
    if image.is_data_uri() {
        let uri = image.parse_data_uri().ok_or_else(|| {
            StudioError::image_fetch(image.summary(), "only base64 data URIs are supported")
        })?;
        return Ok(Some(InlineImage::new(uri.mime_type, uri.data)));
    }

    let data = image.as_str().trim();
    if data.is_empty() {
        return Err(StudioError::image_fetch("", "empty image reference"));
    }
    Ok(Some(InlineImage::from_base64(data)))
}

#[async_trait]
impl ImageResolver for HttpImageResolver {
    async fn resolve(&self, image: &ImageRef) -> Result<InlineImage> {
        match resolve_local(image)? {
            Some(inline) => Ok(inline),
            None => self.download(image.as_str()).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_data_uri_passes_through() {
        let resolver = HttpImageResolver::new();
        let image = ImageRef::from_base64("image/webp", "UklGRg==");
        let inline = resolver.resolve(&image).await.unwrap();
        assert_eq!(inline, InlineImage::new("image/webp", "UklGRg=="));
    }

    #[tokio::test]
    async fn test_bare_base64_is_sniffed() {
        let resolver = HttpImageResolver::new();
        let jpeg = resolver.resolve(&ImageRef::new("/9j/4AAQSkZJRg")).await.unwrap();
        assert_eq!(jpeg.mime_type, "image/jpeg");
        let png = resolver.resolve(&ImageRef::new("iVBORw0KGgo=")).await.unwrap();
        assert_eq!(png.mime_type, "image/png");
    }

    #[tokio::test]
    async fn test_non_base64_data_uri_is_rejected() {
        let resolver = HttpImageResolver::new();
        let err = resolver
            .resolve(&ImageRef::new("data:image/svg+xml,<svg/>"))
            .await
            .unwrap_err();
        assert!(matches!(err, StudioError::ImageFetch { .. }));
    }

    #[tokio::test]
    async fn test_unreachable_url_suggests_local_upload() {
        let resolver = HttpImageResolver::new();
        let err = resolver
            .resolve(&ImageRef::new("http://127.0.0.1:9/preset.jpg"))
            .await
            .unwrap_err();

        match &err {
            StudioError::ImageFetch { source_url, .. } => {
                assert_eq!(source_url, "http://127.0.0.1:9/preset.jpg")
            }
            other => panic!("Expected ImageFetch, got {:?}", other),
        }
        assert!(err.user_message().contains("upload"));
        assert!(err.is_retryable());
    }
}
