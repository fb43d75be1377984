//! Local image files turned into self-contained data URIs.

use std::fs;
use std::path::Path;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use studio_core::error::{Result, StudioError};
use studio_core::image::ImageRef;

/// Reads the image at `path` and encodes it as a `data:` reference.
///
/// The mime type is guessed from the file extension; files that are not
/// images, or are empty, are rejected.
pub fn read_image_file(path: &Path) -> Result<ImageRef> {
    let mime = mime_guess::from_path(path)
        .first()
        .filter(|mime| mime.type_() == mime_guess::mime::IMAGE)
        .ok_or_else(|| {
            StudioError::invalid_input(format!("Not a recognised image file: {}", path.display()))
        })?;

    let bytes = fs::read(path)
        .map_err(|e| StudioError::io(format!("Failed to read {}: {}", path.display(), e)))?;
    if bytes.is_empty() {
        return Err(StudioError::invalid_input(format!(
            "Image file is empty: {}",
            path.display()
        )));
    }

    tracing::debug!(
        "[Uploads] Encoded {} ({}, {} bytes)",
        path.display(),
        mime,
        bytes.len()
    );
    Ok(ImageRef::from_base64(mime.essence_str(), &STANDARD.encode(&bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_png_becomes_data_uri() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("face.png");
        fs::write(&path, [0x89, b'P', b'N', b'G']).unwrap();

        let image = read_image_file(&path).unwrap();
        assert!(image.is_data_uri());
        let parsed = image.parse_data_uri().unwrap();
        assert_eq!(parsed.mime_type, "image/png");
        assert_eq!(STANDARD.decode(parsed.data).unwrap(), vec![0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn test_jpeg_extension() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("photo.JPG");
        fs::write(&path, [0xff, 0xd8, 0xff]).unwrap();

        let image = read_image_file(&path).unwrap();
        assert!(image.as_str().starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn test_rejects_non_images_and_empty_files() {
        let temp_dir = TempDir::new().unwrap();
        let text = temp_dir.path().join("notes.txt");
        fs::write(&text, "hello").unwrap();
        assert!(read_image_file(&text).is_err());

        let empty = temp_dir.path().join("empty.png");
        fs::write(&empty, b"").unwrap();
        assert!(read_image_file(&empty).is_err());

        assert!(read_image_file(&temp_dir.path().join("missing.png")).is_err());
    }
}
