/// Camera capture and photo upload
///
/// This module handles:
/// - The camera backend seam (backend.rs)
/// - Owning an open camera: live preview, snapshots, release (device.rs)
/// - Native webcam access through OpenCV (opencv.rs, `opencv-camera` feature)
/// - Reading an uploaded photo from disk (upload.rs)

pub mod backend;
pub mod device;
#[cfg(feature = "opencv-camera")]
pub mod opencv;
pub mod upload;

pub use backend::{CameraBackend, CameraRequest, FrameSource};
pub use device::{CameraSession, CaptureDevice};

use std::sync::Arc;

use crate::config::Config;

/// The camera backend compiled into this build
pub fn default_backend(_config: &Config) -> Arc<dyn CameraBackend> {
    #[cfg(feature = "opencv-camera")]
    {
        Arc::new(opencv::OpenCvBackend::new(_config.camera_index))
    }
    #[cfg(not(feature = "opencv-camera"))]
    {
        Arc::new(backend::NoCamera)
    }
}
