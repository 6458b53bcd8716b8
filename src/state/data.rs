/// Shared data structures for the application state
///
/// These structs represent the images that flow between the camera,
/// the generation service and the UI layer.
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::scenes::Scene;

/// An encoded still image (JPEG, PNG, ...) with its MIME type
///
/// The bytes are reference counted so the image can travel through UI
/// messages and background tasks without copying.
#[derive(Clone, PartialEq, Eq)]
pub struct EncodedImage {
    bytes: Arc<[u8]>,
    mime_type: String,
}

impl EncodedImage {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            mime_type: mime_type.into(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// True if both values share the same underlying buffer
    pub fn is_same(&self, other: &EncodedImage) -> bool {
        Arc::ptr_eq(&self.bytes, &other.bytes)
    }
}

impl std::fmt::Debug for EncodedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncodedImage")
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Where a captured image came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageOrigin {
    Camera,
    Upload,
}

/// The user's photo, waiting to be sent through time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedImage {
    pub image: EncodedImage,
    pub origin: ImageOrigin,
}

impl CapturedImage {
    pub fn from_camera(jpeg: Vec<u8>) -> Self {
        Self {
            image: EncodedImage::new(jpeg, "image/jpeg"),
            origin: ImageOrigin::Camera,
        }
    }

    pub fn from_upload(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            image: EncodedImage::new(bytes, mime_type),
            origin: ImageOrigin::Upload,
        }
    }

    /// True if `other` is this very capture (not merely equal bytes)
    pub fn is_same(&self, other: &CapturedImage) -> bool {
        self.image.is_same(&other.image)
    }
}

/// A stylized image returned by the generation service
#[derive(Debug, Clone)]
pub struct GeneratedResult {
    pub image: EncodedImage,
    /// The scene the image was generated for
    pub scene: &'static Scene,
    pub created_at: DateTime<Utc>,
    /// The capture the image was generated from
    pub source: CapturedImage,
}

impl GeneratedResult {
    /// True if this result was produced from exactly this capture and scene
    pub fn matches(&self, image: &CapturedImage, scene: &Scene) -> bool {
        self.scene.id == scene.id && self.source.is_same(image)
    }
}
