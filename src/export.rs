/// Saving a generated image to disk
use image::codecs::jpeg::JpegEncoder;
use image::ImageFormat;
use rfd::FileDialog;
use std::path::PathBuf;
use tracing::info;

use crate::error::BoothError;
use crate::state::GeneratedResult;

/// Prefix of every downloaded file
const PRODUCT_SLUG: &str = "chronosnap";

/// Quality used when a non-JPEG result has to be re-encoded
const EXPORT_QUALITY: u8 = 92;

/// `chronosnap-<sceneId>-<unix millis>.jpg`
pub fn download_file_name(result: &GeneratedResult) -> String {
    format!(
        "{}-{}-{}.jpg",
        PRODUCT_SLUG,
        result.scene.id,
        result.created_at.timestamp_millis()
    )
}

/// Show the native save dialog, defaulting to the Downloads folder
pub fn pick_destination(result: &GeneratedResult) -> Option<PathBuf> {
    let mut dialog = FileDialog::new()
        .set_title("Save Your Time Travel Photo")
        .set_file_name(download_file_name(result))
        .add_filter("JPEG", &["jpg", "jpeg"]);

    if let Some(dir) = dirs::download_dir().or_else(dirs::picture_dir) {
        dialog = dialog.set_directory(dir);
    }

    dialog.save_file()
}

/// The result as JPEG bytes, re-encoding if the service sent another format
pub fn jpeg_bytes(result: &GeneratedResult) -> Result<Vec<u8>, BoothError> {
    let bytes = result.image.bytes();
    if image::guess_format(bytes).ok() == Some(ImageFormat::Jpeg) {
        return Ok(bytes.to_vec());
    }

    let decoded = image::load_from_memory(bytes)?.into_rgb8();
    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, EXPORT_QUALITY).encode_image(&decoded)?;
    info!(
        "🔄 Re-encoded {} result as JPEG ({} KB)",
        result.image.mime_type(),
        jpeg.len() / 1024
    );
    Ok(jpeg)
}

/// Write the result to `path` as a JPEG
pub async fn save_result(result: GeneratedResult, path: PathBuf) -> Result<PathBuf, BoothError> {
    // Decoding and encoding are CPU bound
    let jpeg = tokio::task::spawn_blocking(move || jpeg_bytes(&result))
        .await
        .map_err(|e| BoothError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))??;

    tokio::fs::write(&path, &jpeg).await?;
    info!("💾 Saved {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenes;
    use crate::state::{CapturedImage, EncodedImage};
    use chrono::TimeZone;
    use image::{Rgb, RgbImage};
    use std::io::Cursor;

    fn result_with(bytes: Vec<u8>, mime: &str) -> GeneratedResult {
        GeneratedResult {
            image: EncodedImage::new(bytes, mime),
            scene: scenes::find("viking").unwrap(),
            created_at: chrono::Utc.timestamp_millis_opt(1_700_000_000_123).unwrap(),
            source: CapturedImage::from_camera(vec![0xFF, 0xD8]),
        }
    }

    fn encoded(format: ImageFormat) -> Vec<u8> {
        let img = RgbImage::from_pixel(8, 6, Rgb([200, 100, 50]));
        let mut out = Vec::new();
        img.write_to(&mut Cursor::new(&mut out), format).unwrap();
        out
    }

    #[test]
    fn test_file_name() {
        let result = result_with(vec![], "image/png");
        assert_eq!(
            download_file_name(&result),
            "chronosnap-viking-1700000000123.jpg"
        );
    }

    #[test]
    fn test_jpeg_passes_through() {
        let jpeg = encoded(ImageFormat::Jpeg);
        let result = result_with(jpeg.clone(), "image/jpeg");
        assert_eq!(jpeg_bytes(&result).unwrap(), jpeg);
    }

    #[test]
    fn test_png_is_reencoded() {
        let result = result_with(encoded(ImageFormat::Png), "image/png");
        let out = jpeg_bytes(&result).unwrap();
        assert_eq!(image::guess_format(&out).unwrap(), ImageFormat::Jpeg);
        let decoded = image::load_from_memory(&out).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (8, 6));
    }

    #[test]
    fn test_garbage_fails() {
        let result = result_with(b"not an image".to_vec(), "image/png");
        assert!(matches!(jpeg_bytes(&result), Err(BoothError::Encode(_))));
    }

    #[tokio::test]
    async fn test_save_result() {
        let dir = tempfile::tempdir().unwrap();
        let result = result_with(encoded(ImageFormat::Png), "image/png");
        let path = dir.path().join(download_file_name(&result));

        let saved = save_result(result, path.clone()).await.unwrap();
        assert_eq!(saved, path);
        let written = std::fs::read(&path).unwrap();
        assert_eq!(image::guess_format(&written).unwrap(), ImageFormat::Jpeg);
    }
}
