/// Ownership of the camera while the capture view is up
///
/// A `CameraSession` is the single handle to an acquired camera. A reader
/// thread keeps the newest frame in shared state for the preview and the
/// shutter. `close()` stops the thread and releases the device; it is
/// idempotent and also runs on drop, so the camera is freed on every exit
/// path.
///
/// `CaptureDevice` hands out at most one session at a time: every session
/// holds the device's single permit until it is closed, and a background
/// acquisition waits for that permit before touching the backend.
use image::buffer::ConvertBuffer;
use image::codecs::jpeg::JpegEncoder;
use image::{imageops, RgbImage, RgbaImage};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, info, warn};

use super::backend::{CameraBackend, CameraRequest, FrameSource};
use crate::error::BoothError;
use crate::state::CapturedImage;

/// JPEG quality for snapshots
const SNAPSHOT_QUALITY: u8 = 90;

/// How long the shutter waits for the first frame of a fresh session
const FIRST_FRAME_TIMEOUT: Duration = Duration::from_secs(2);

/// Latest state of the frame stream
enum FrameSlot {
    Waiting,
    /// Native frame for the shutter, mirrored RGBA copy for display
    Frame { frame: RgbImage, preview: RgbaImage },
    Failed(String),
}

struct Shared {
    slot: Mutex<FrameSlot>,
    frame_ready: Condvar,
    running: AtomicBool,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, FrameSlot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// An open camera
pub struct CameraSession {
    shared: Arc<Shared>,
    reader: Option<JoinHandle<()>>,
    /// Exclusive claim on the device, if this session came from a `CaptureDevice`
    permit: Option<OwnedSemaphorePermit>,
}

impl CameraSession {
    /// Start streaming from an acquired source
    pub fn start(source: Box<dyn FrameSource>) -> Self {
        let shared = Arc::new(Shared {
            slot: Mutex::new(FrameSlot::Waiting),
            frame_ready: Condvar::new(),
            running: AtomicBool::new(true),
        });

        let reader_shared = Arc::clone(&shared);
        let reader = thread::Builder::new()
            .name("camera-reader".to_string())
            .spawn(move || read_frames(source, reader_shared));

        let reader = match reader {
            Ok(handle) => Some(handle),
            Err(e) => {
                // Source was moved into the failed closure and is already dropped
                *shared.lock() = FrameSlot::Failed(format!("could not start camera thread: {}", e));
                shared.running.store(false, Ordering::SeqCst);
                None
            }
        };

        CameraSession {
            shared,
            reader,
            permit: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    /// Encode the current frame as a JPEG, at native resolution and unmirrored
    pub fn snapshot(&self) -> Result<CapturedImage, BoothError> {
        if self.reader.is_none() {
            if let Some(reason) = self.failure() {
                return Err(BoothError::DeviceUnavailable(reason));
            }
            return Err(BoothError::NotOpen);
        }

        let frame = {
            let guard = self.shared.lock();
            let (guard, _) = self
                .shared
                .frame_ready
                .wait_timeout_while(guard, FIRST_FRAME_TIMEOUT, |slot| {
                    matches!(slot, FrameSlot::Waiting)
                })
                .unwrap_or_else(PoisonError::into_inner);

            match &*guard {
                FrameSlot::Frame { frame, .. } => frame.clone(),
                FrameSlot::Failed(reason) => {
                    return Err(BoothError::DeviceUnavailable(reason.clone()))
                }
                FrameSlot::Waiting => {
                    return Err(BoothError::DeviceUnavailable(
                        "camera produced no frames".to_string(),
                    ))
                }
            }
        };

        let jpeg = encode_jpeg(&frame)?;
        info!(
            "📸 Snapshot taken ({}x{}, {} KB)",
            frame.width(),
            frame.height(),
            jpeg.len() / 1024
        );
        Ok(CapturedImage::from_camera(jpeg))
    }

    /// The latest frame, mirrored for display
    pub fn preview_frame(&self) -> Option<RgbaImage> {
        match &*self.shared.lock() {
            FrameSlot::Frame { preview, .. } => Some(preview.clone()),
            _ => None,
        }
    }

    /// Why the stream stopped, if it failed
    pub fn failure(&self) -> Option<String> {
        match &*self.shared.lock() {
            FrameSlot::Failed(reason) => Some(reason.clone()),
            _ => None,
        }
    }

    /// Stop streaming and release the device. Safe to call repeatedly.
    pub fn close(&mut self) {
        self.shared.running.store(false, Ordering::SeqCst);
        if let Some(reader) = self.reader.take() {
            if reader.join().is_err() {
                warn!("⚠️  Camera reader thread panicked");
            }
            debug!("Camera reader stopped");
        }
        // The reader has dropped its source, so the device is free again
        if self.permit.take().is_some() {
            debug!("Camera slot released");
        }
    }
}

impl Drop for CameraSession {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for CameraSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraSession")
            .field("open", &self.is_open())
            .finish()
    }
}

/// Reader thread body: pull frames until told to stop or the source fails
fn read_frames(mut source: Box<dyn FrameSource>, shared: Arc<Shared>) {
    while shared.running.load(Ordering::SeqCst) {
        match source.next_frame() {
            Ok(frame) => {
                let preview = mirrored_rgba(&frame);
                *shared.lock() = FrameSlot::Frame { frame, preview };
                shared.frame_ready.notify_all();
            }
            Err(e) => {
                warn!("⚠️  Camera stream failed: {}", e);
                let reason = match e {
                    BoothError::DeviceUnavailable(reason) => reason,
                    other => other.to_string(),
                };
                *shared.lock() = FrameSlot::Failed(reason);
                shared.frame_ready.notify_all();
                shared.running.store(false, Ordering::SeqCst);
                break;
            }
        }
    }
    // Dropping the source here releases the device
    drop(source);
}

/// RGBA copy of a frame, flipped so the preview behaves like a mirror
fn mirrored_rgba(frame: &RgbImage) -> RgbaImage {
    let mut rgba: RgbaImage = frame.convert();
    imageops::flip_horizontal_in_place(&mut rgba);
    rgba
}

fn encode_jpeg(frame: &RgbImage) -> Result<Vec<u8>, BoothError> {
    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, SNAPSHOT_QUALITY).encode_image(frame)?;
    Ok(jpeg)
}

/// Acquire a camera and start streaming (blocking)
///
/// The session keeps `permit` until it is closed. On failure the permit is
/// dropped here.
pub fn acquire_session(
    backend: &dyn CameraBackend,
    request: &CameraRequest,
    permit: OwnedSemaphorePermit,
) -> Result<CameraSession, BoothError> {
    let source = backend.acquire(request)?;
    info!("📷 Camera acquired");
    let mut session = CameraSession::start(source);
    session.permit = Some(permit);
    Ok(session)
}

/// The capture device adapter used by the app
///
/// Holds at most one open session at a time.
pub struct CaptureDevice {
    backend: Arc<dyn CameraBackend>,
    request: CameraRequest,
    session: Option<CameraSession>,
    /// One permit: held by whichever session is acquiring or open
    gate: Arc<Semaphore>,
}

impl CaptureDevice {
    pub fn new(backend: Arc<dyn CameraBackend>) -> Self {
        CaptureDevice {
            backend,
            request: CameraRequest::selfie(),
            session: None,
            gate: Arc::new(Semaphore::new(1)),
        }
    }

    /// Open the front camera, blocking the caller until it is acquired
    ///
    /// Opening an already open device keeps the existing session. Fails
    /// while a background acquisition or an unadopted session holds the
    /// camera.
    pub fn open(&mut self) -> Result<(), BoothError> {
        if self.session.is_some() {
            return Ok(());
        }
        let permit = Arc::clone(&self.gate)
            .try_acquire_owned()
            .map_err(|_| BoothError::DeviceUnavailable("camera is busy".to_string()))?;
        let session = acquire_session(self.backend.as_ref(), &self.request, permit)?;
        self.session = Some(session);
        Ok(())
    }

    /// Acquire a session on a blocking worker, for use from async UI tasks
    ///
    /// The returned session must be handed back through `adopt` or dropped.
    /// Waits until every earlier session, abandoned ones included, has
    /// released the camera.
    pub fn acquire_in_background(
        &self,
    ) -> impl Future<Output = Result<CameraSession, BoothError>> + Send + 'static {
        let backend = Arc::clone(&self.backend);
        let gate = Arc::clone(&self.gate);
        let request = self.request;
        async move {
            let permit = gate.acquire_owned().await.map_err(|e| {
                BoothError::DeviceUnavailable(format!("camera gate closed: {}", e))
            })?;
            debug!("Camera slot claimed");
            tokio::task::spawn_blocking(move || acquire_session(backend.as_ref(), &request, permit))
                .await
                .map_err(|e| BoothError::DeviceUnavailable(format!("camera task failed: {}", e)))?
        }
    }

    /// Install a session acquired in the background
    ///
    /// If a session is already open the new one is released immediately.
    pub fn adopt(&mut self, mut session: CameraSession) {
        if self.session.is_some() {
            warn!("⚠️  Camera already open, releasing duplicate session");
            session.close();
            return;
        }
        self.session = Some(session);
    }

    pub fn is_open(&self) -> bool {
        self.session.as_ref().is_some_and(CameraSession::is_open)
    }

    /// Capture the current frame. The device stays open.
    pub fn snapshot(&self) -> Result<CapturedImage, BoothError> {
        self.session
            .as_ref()
            .ok_or(BoothError::NotOpen)?
            .snapshot()
    }

    pub fn preview_frame(&self) -> Option<RgbaImage> {
        self.session.as_ref().and_then(CameraSession::preview_frame)
    }

    /// Why the open session stopped streaming, if it did
    pub fn failure(&self) -> Option<String> {
        self.session.as_ref().and_then(CameraSession::failure)
    }

    /// Release the camera. Does nothing if already closed.
    pub fn close(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.close();
            info!("📷 Camera released");
        }
    }
}

impl Drop for CaptureDevice {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use std::sync::atomic::AtomicUsize;

    /// Produces a frame whose left half is red and right half blue
    struct FakeSource {
        released: Arc<AtomicUsize>,
    }

    impl FrameSource for FakeSource {
        fn next_frame(&mut self) -> Result<RgbImage, BoothError> {
            thread::sleep(Duration::from_millis(2));
            Ok(RgbImage::from_fn(64, 48, |x, _| {
                if x < 32 {
                    Rgb([255, 0, 0])
                } else {
                    Rgb([0, 0, 255])
                }
            }))
        }
    }

    impl Drop for FakeSource {
        fn drop(&mut self) {
            self.released.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[derive(Default)]
    struct FakeBackend {
        acquired: AtomicUsize,
        released: Arc<AtomicUsize>,
    }

    impl CameraBackend for FakeBackend {
        fn acquire(&self, request: &CameraRequest) -> Result<Box<dyn FrameSource>, BoothError> {
            assert!(request.front_facing);
            assert!(!request.audio);
            self.acquired.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(FakeSource {
                released: Arc::clone(&self.released),
            }))
        }
    }

    struct DeniedBackend;

    impl CameraBackend for DeniedBackend {
        fn acquire(&self, _request: &CameraRequest) -> Result<Box<dyn FrameSource>, BoothError> {
            Err(BoothError::DeviceUnavailable("permission denied".to_string()))
        }
    }

    /// Yields one frame, then fails
    struct FlakySource {
        served: bool,
    }

    impl FrameSource for FlakySource {
        fn next_frame(&mut self) -> Result<RgbImage, BoothError> {
            if self.served {
                return Err(BoothError::DeviceUnavailable("unplugged".to_string()));
            }
            self.served = true;
            Ok(RgbImage::new(8, 8))
        }
    }

    /// Slow to acquire, like a camera behind a permission prompt. Counts
    /// sources that are acquiring or open.
    #[derive(Default)]
    struct SlowBackend {
        live: Arc<AtomicUsize>,
        peak: AtomicUsize,
    }

    struct CountedSource {
        live: Arc<AtomicUsize>,
    }

    impl FrameSource for CountedSource {
        fn next_frame(&mut self) -> Result<RgbImage, BoothError> {
            thread::sleep(Duration::from_millis(2));
            Ok(RgbImage::new(8, 8))
        }
    }

    impl Drop for CountedSource {
        fn drop(&mut self) {
            self.live.fetch_sub(1, Ordering::SeqCst);
        }
    }

    impl CameraBackend for SlowBackend {
        fn acquire(&self, _request: &CameraRequest) -> Result<Box<dyn FrameSource>, BoothError> {
            let now = self.live.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(200));
            Ok(Box::new(CountedSource {
                live: Arc::clone(&self.live),
            }))
        }
    }

    #[test]
    fn test_snapshot_requires_open() {
        let device = CaptureDevice::new(Arc::new(FakeBackend::default()));
        assert!(matches!(device.snapshot(), Err(BoothError::NotOpen)));
    }

    #[test]
    fn test_open_snapshot_close() {
        let backend = Arc::new(FakeBackend::default());
        let mut device = CaptureDevice::new(backend.clone());

        device.open().unwrap();
        assert!(device.is_open());

        let captured = device.snapshot().unwrap();
        assert_eq!(captured.image.mime_type(), "image/jpeg");
        // Snapshot does not close the device
        assert!(device.is_open());

        let decoded = image::load_from_memory(captured.image.bytes())
            .unwrap()
            .into_rgb8();
        assert_eq!(decoded.dimensions(), (64, 48));
        // Not mirrored: red stays on the left
        let left = decoded.get_pixel(4, 24);
        let right = decoded.get_pixel(60, 24);
        assert!(left[0] > 200 && left[2] < 60);
        assert!(right[2] > 200 && right[0] < 60);

        device.close();
        assert!(!device.is_open());
        assert_eq!(backend.released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_preview_is_mirrored() {
        let mut device = CaptureDevice::new(Arc::new(FakeBackend::default()));
        device.open().unwrap();
        // Wait for a frame through the shutter path
        device.snapshot().unwrap();

        let preview = device.preview_frame().unwrap();
        assert_eq!(preview.dimensions(), (64, 48));
        assert_eq!(preview.get_pixel(4, 24).0, [0, 0, 255, 255]);
        assert_eq!(preview.get_pixel(60, 24).0, [255, 0, 0, 255]);
    }

    #[test]
    fn test_close_is_idempotent() {
        let backend = Arc::new(FakeBackend::default());
        let mut device = CaptureDevice::new(backend.clone());
        device.close();

        device.open().unwrap();
        device.close();
        device.close();
        device.close();
        assert_eq!(backend.released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_open_twice_keeps_one_handle() {
        let backend = Arc::new(FakeBackend::default());
        let mut device = CaptureDevice::new(backend.clone());
        device.open().unwrap();
        device.open().unwrap();
        assert_eq!(backend.acquired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_adopt_releases_duplicate() {
        let backend = Arc::new(FakeBackend::default());
        let mut device = CaptureDevice::new(backend.clone());
        device.open().unwrap();

        let permit = Arc::new(Semaphore::new(1)).try_acquire_owned().unwrap();
        let extra = acquire_session(backend.as_ref(), &CameraRequest::selfie(), permit).unwrap();
        device.adopt(extra);
        assert_eq!(backend.acquired.load(Ordering::SeqCst), 2);
        assert_eq!(backend.released.load(Ordering::SeqCst), 1);
        assert!(device.is_open());
    }

    #[test]
    fn test_drop_releases_camera() {
        let backend = Arc::new(FakeBackend::default());
        {
            let mut device = CaptureDevice::new(backend.clone());
            device.open().unwrap();
        }
        assert_eq!(backend.released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_denied_is_device_unavailable() {
        let mut device = CaptureDevice::new(Arc::new(DeniedBackend));
        let err = device.open().unwrap_err();
        assert!(matches!(err, BoothError::DeviceUnavailable(_)));
        assert!(!device.is_open());
    }

    #[test]
    fn test_stream_failure_is_reported() {
        let mut session = CameraSession::start(Box::new(FlakySource { served: false }));
        // Reader stops on the second read
        for _ in 0..200 {
            if !session.is_open() {
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }
        assert!(!session.is_open());
        assert_eq!(session.failure().as_deref(), Some("unplugged"));
        assert!(matches!(
            session.snapshot(),
            Err(BoothError::DeviceUnavailable(_))
        ));
        session.close();
    }

    #[tokio::test]
    async fn test_background_acquire_and_adopt() {
        let backend = Arc::new(FakeBackend::default());
        let mut device = CaptureDevice::new(backend.clone());
        let session = device.acquire_in_background().await.unwrap();
        device.adopt(session);
        assert!(device.is_open());
        device.close();
        assert_eq!(backend.released.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_background_acquisitions_never_overlap() {
        let backend = Arc::new(SlowBackend::default());
        let mut device = CaptureDevice::new(backend.clone());

        // Take photo, cancel, take photo again while the first camera is still opening
        let first = tokio::spawn(device.acquire_in_background());
        tokio::time::sleep(Duration::from_millis(50)).await;
        device.close();
        let second = tokio::spawn(device.acquire_in_background());

        // The shell drops the abandoned session when it arrives
        let abandoned = first.await.unwrap().unwrap();
        drop(abandoned);

        let session = second.await.unwrap().unwrap();
        device.adopt(session);
        assert!(device.is_open());
        device.close();

        assert_eq!(backend.peak.load(Ordering::SeqCst), 1);
        assert_eq!(backend.live.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_open_refused_while_session_outstanding() {
        let mut device = CaptureDevice::new(Arc::new(FakeBackend::default()));
        let pending = device.acquire_in_background().await.unwrap();

        assert!(matches!(device.open(), Err(BoothError::DeviceUnavailable(_))));
        assert!(!device.is_open());

        drop(pending);
        device.open().unwrap();
        assert!(device.is_open());
    }

    #[test]
    fn test_mirrored_rgba() {
        let frame = RgbImage::from_fn(2, 1, |x, _| {
            if x == 0 {
                Rgb([255, 0, 0])
            } else {
                Rgb([0, 0, 255])
            }
        });
        let preview = mirrored_rgba(&frame);
        assert_eq!(preview.get_pixel(0, 0).0, [0, 0, 255, 255]);
        assert_eq!(preview.get_pixel(1, 0).0, [255, 0, 0, 255]);
    }
}
