/// Webcam backend built on OpenCV's videoio
use image::RgbImage;
use opencv::core::Mat;
use opencv::prelude::*;
use opencv::{imgproc, videoio};
use tracing::{info, warn};

use super::backend::{CameraBackend, CameraRequest, FrameSource};
use crate::error::BoothError;

/// Empty reads tolerated in a row while a camera warms up
const MAX_EMPTY_READS: usize = 30;

fn unavailable(e: opencv::Error) -> BoothError {
    BoothError::DeviceUnavailable(e.to_string())
}

pub struct OpenCvBackend {
    device_index: i32,
}

impl OpenCvBackend {
    pub fn new(device_index: i32) -> Self {
        OpenCvBackend { device_index }
    }
}

impl CameraBackend for OpenCvBackend {
    fn acquire(&self, request: &CameraRequest) -> Result<Box<dyn FrameSource>, BoothError> {
        // videoio has no notion of facing; laptops expose the front camera first
        if !request.front_facing {
            warn!("⚠️  Rear camera requested, opening device {} anyway", self.device_index);
        }

        info!("📷 Opening camera {}", self.device_index);
        let capture = videoio::VideoCapture::new(self.device_index, videoio::CAP_ANY)
            .map_err(unavailable)?;

        if !capture.is_opened().unwrap_or(false) {
            return Err(BoothError::DeviceUnavailable(format!(
                "camera {} could not be opened (missing device or permission denied)",
                self.device_index
            )));
        }

        Ok(Box::new(OpenCvSource {
            capture,
            bgr: Mat::default(),
        }))
    }
}

struct OpenCvSource {
    capture: videoio::VideoCapture,
    bgr: Mat,
}

impl FrameSource for OpenCvSource {
    fn next_frame(&mut self) -> Result<RgbImage, BoothError> {
        let mut empty_reads = 0;
        loop {
            match self.capture.read(&mut self.bgr) {
                Ok(true) if !self.bgr.empty() => break,
                Ok(_) => {
                    empty_reads += 1;
                    if empty_reads >= MAX_EMPTY_READS {
                        return Err(BoothError::DeviceUnavailable(
                            "camera stopped delivering frames".to_string(),
                        ));
                    }
                }
                Err(e) => return Err(unavailable(e)),
            }
        }

        let mut rgb = Mat::default();
        imgproc::cvt_color(&self.bgr, &mut rgb, imgproc::COLOR_BGR2RGB, 0).map_err(unavailable)?;

        let size = rgb.size().map_err(unavailable)?;
        let data = rgb.data_bytes().map_err(unavailable)?.to_vec();

        RgbImage::from_raw(size.width as u32, size.height as u32, data).ok_or_else(|| {
            BoothError::DeviceUnavailable("camera frame has an unexpected layout".to_string())
        })
    }
}

impl Drop for OpenCvSource {
    fn drop(&mut self) {
        if let Err(e) = self.capture.release() {
            warn!("⚠️  Failed to release camera: {}", e);
        }
    }
}
