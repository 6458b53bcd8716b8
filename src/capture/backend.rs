use image::RgbImage;

use crate::error::BoothError;

/// What to ask the platform for when opening a camera
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraRequest {
    /// Prefer the camera looking at the user
    pub front_facing: bool,
    pub audio: bool,
}

impl CameraRequest {
    /// Front-facing video, no audio
    pub fn selfie() -> Self {
        CameraRequest {
            front_facing: true,
            audio: false,
        }
    }
}

/// A live stream of frames from an acquired camera
///
/// Dropping the source releases the device.
pub trait FrameSource: Send {
    /// Block until the next frame is available
    fn next_frame(&mut self) -> Result<RgbImage, BoothError>;
}

/// Platform media-capture service
pub trait CameraBackend: Send + Sync {
    /// Acquire exclusive access to a camera matching `request`
    ///
    /// Fails with `DeviceUnavailable` if permission is denied or no
    /// compatible device exists.
    fn acquire(&self, request: &CameraRequest) -> Result<Box<dyn FrameSource>, BoothError>;
}

/// Backend for builds without camera support
#[derive(Debug, Default)]
pub struct NoCamera;

impl CameraBackend for NoCamera {
    fn acquire(&self, _request: &CameraRequest) -> Result<Box<dyn FrameSource>, BoothError> {
        Err(BoothError::DeviceUnavailable(
            "built without camera support".to_string(),
        ))
    }
}
