/// Uploading an existing photo instead of using the camera
use image::ImageFormat;
use rfd::FileDialog;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::BoothError;
use crate::state::CapturedImage;

/// File extensions offered in the picker
pub const PHOTO_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// Show the native file picker. None if the user cancelled.
pub fn pick_photo() -> Option<PathBuf> {
    FileDialog::new()
        .set_title("Choose a Photo")
        .add_filter("Images", PHOTO_EXTENSIONS)
        .pick_file()
}

/// Read a photo from disk to completion
pub async fn read_photo(path: PathBuf) -> Result<CapturedImage, BoothError> {
    let bytes = tokio::fs::read(&path).await?;
    let mime_type = sniff_mime(&bytes).ok_or_else(|| unsupported(&path))?;

    info!(
        "🖼️  Loaded {} ({} KB, {})",
        path.display(),
        bytes.len() / 1024,
        mime_type
    );
    Ok(CapturedImage::from_upload(bytes, mime_type))
}

/// MIME type of a supported photo, judged by content rather than extension
pub fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    match image::guess_format(bytes).ok()? {
        ImageFormat::Jpeg => Some("image/jpeg"),
        ImageFormat::Png => Some("image/png"),
        ImageFormat::WebP => Some("image/webp"),
        _ => None,
    }
}

fn unsupported(path: &Path) -> BoothError {
    BoothError::UnsupportedImage(
        path.file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ImageOrigin;
    use image::{Rgb, RgbImage};
    use std::io::Cursor;

    fn png_bytes() -> Vec<u8> {
        let img = RgbImage::from_pixel(4, 4, Rgb([10, 20, 30]));
        let mut out = Vec::new();
        img.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
            .unwrap();
        out
    }

    #[test]
    fn test_sniff_mime() {
        assert_eq!(sniff_mime(&png_bytes()), Some("image/png"));
        assert_eq!(sniff_mime(&[0xFF, 0xD8, 0xFF, 0xE0, 0, 0]), Some("image/jpeg"));
        assert_eq!(sniff_mime(b"hello world"), None);
    }

    #[tokio::test]
    async fn test_read_photo() {
        let dir = tempfile::tempdir().unwrap();
        // Extension deliberately wrong: content decides
        let path = dir.path().join("photo.jpg");
        std::fs::write(&path, png_bytes()).unwrap();

        let captured = read_photo(path).await.unwrap();
        assert_eq!(captured.origin, ImageOrigin::Upload);
        assert_eq!(captured.image.mime_type(), "image/png");
        assert_eq!(captured.image.bytes(), png_bytes().as_slice());
    }

    #[tokio::test]
    async fn test_read_non_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.png");
        std::fs::write(&path, b"definitely not a picture").unwrap();

        let err = read_photo(path).await.unwrap_err();
        assert!(matches!(err, BoothError::UnsupportedImage(name) if name == "notes.png"));
    }

    #[tokio::test]
    async fn test_read_missing_file() {
        let err = read_photo(PathBuf::from("/nonexistent/selfie.jpg"))
            .await
            .unwrap_err();
        assert!(matches!(err, BoothError::Io(_)));
    }
}
