use iced::time;
use iced::widget::image::Handle;
use iced::widget::{column, container};
use iced::{Element, Length, Subscription, Task, Theme};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, error, info, warn};

mod capture;
mod config;
mod error;
mod export;
mod generation;
mod logging;
mod scenes;
mod state;
mod ui;

use capture::upload;
use capture::{CameraSession, CaptureDevice};
use config::Config;
use error::BoothError;
use generation::GenerationClient;
use state::{Booth, CapturedImage, Effect, EncodedImage, Event, GeneratedResult, Step, Ticket};
use ui::loader::Spinner;

/// Preview refresh interval while the camera is live (~30 fps)
const PREVIEW_INTERVAL: Duration = Duration::from_millis(33);

/// Spinner animation interval while generating
const SPINNER_INTERVAL: Duration = Duration::from_millis(16);

/// One-shot transfer of a camera session through a cloneable message
#[derive(Clone)]
pub struct SessionHandoff(Arc<Mutex<Option<CameraSession>>>);

impl std::fmt::Debug for SessionHandoff {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionHandoff")
    }
}

impl SessionHandoff {
    fn new(session: CameraSession) -> Self {
        SessionHandoff(Arc::new(Mutex::new(Some(session))))
    }

    fn take(&self) -> Option<CameraSession> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).take()
    }
}

/// Main application state
struct PhotoBooth {
    /// The booth flow (single source of truth for the current step)
    booth: Booth,
    /// The camera, open only while capturing
    device: CaptureDevice,
    generator: Arc<GenerationClient>,
    /// Latest mirrored camera frame
    preview: Option<Handle>,
    /// Cached handles so images are not re-decoded every frame
    captured_handle: Option<(CapturedImage, Handle)>,
    result_handle: Option<(EncodedImage, Handle)>,
    spinner: Spinner,
    /// Upload and save feedback
    notice: Option<String>,
}

/// Application messages (events)
#[derive(Debug, Clone)]
pub enum Message {
    TakePhoto,
    /// User clicked "Upload" (start screen or camera error screen)
    UploadPhoto,
    /// Background file read completed
    PhotoLoaded(Result<CapturedImage, Arc<BoothError>>),
    /// Background camera acquisition completed for an attempt
    CameraOpened(Ticket, Result<SessionHandoff, Arc<BoothError>>),
    PreviewTick,
    Shutter,
    CancelCapture,
    Retake,
    SelectScene(&'static str),
    Confirm,
    /// Background generation completed for a request
    GenerationFinished(Ticket, Result<GeneratedResult, Arc<BoothError>>),
    SpinnerTick,
    TryAnother,
    Download,
    Saved(Result<PathBuf, Arc<BoothError>>),
    Reset,
}

impl PhotoBooth {
    /// Create a new instance of the application
    fn new() -> (Self, Task<Message>) {
        (Self::with_config(Config::from_env()), Task::none())
    }

    fn with_config(config: Config) -> Self {
        if !config.has_credential() {
            warn!(
                "⚠️  {} is not set; every generation will fail until it is configured",
                config::API_KEY_VAR
            );
        }

        // Without an HTTP client the booth cannot do anything useful
        let generator = GenerationClient::new(&config)
            .expect("Failed to initialize HTTP client. Check TLS support on this system.");

        let device = CaptureDevice::new(capture::default_backend(&config));
        info!("🕰️  ChronoSnap ready ({:?})", config);

        PhotoBooth {
            booth: Booth::new(),
            device,
            generator: Arc::new(generator),
            preview: None,
            captured_handle: None,
            result_handle: None,
            spinner: Spinner::default(),
            notice: None,
        }
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::TakePhoto => self.dispatch(Event::TakePhoto),
            Message::UploadPhoto => {
                // The camera must be free before an alternate path proceeds
                self.device.close();
                self.preview = None;

                match upload::pick_photo() {
                    Some(path) => Task::perform(upload::read_photo(path), |result| {
                        Message::PhotoLoaded(result.map_err(Arc::new))
                    }),
                    None => Task::none(),
                }
            }
            Message::PhotoLoaded(Ok(image)) => {
                info!("🖼️  Photo ready ({:?}, {})", image.origin, image.image.mime_type());
                self.dispatch(Event::ImageReady(image))
            }
            Message::PhotoLoaded(Err(e)) => {
                warn!("⚠️  Upload failed: {}", e.report());
                self.notice = Some(e.user_message());
                Task::none()
            }
            Message::CameraOpened(attempt, Ok(handoff)) => {
                if let Some(session) = handoff.take() {
                    if self.booth.camera_attempt() == Some(attempt) {
                        self.device.adopt(session);
                    } else {
                        // User left the capture view while the camera was opening
                        info!("📷 Releasing camera opened for abandoned attempt {}", attempt);
                        drop(session);
                    }
                }
                Task::none()
            }
            Message::CameraOpened(attempt, Err(e)) => {
                warn!("⚠️  Camera unavailable: {}", e.report());
                self.dispatch(Event::CameraUnavailable {
                    attempt,
                    reason: e.to_string(),
                })
            }
            Message::PreviewTick => {
                if let Some(frame) = self.device.preview_frame() {
                    let (width, height) = frame.dimensions();
                    self.preview = Some(Handle::from_rgba(width, height, frame.into_raw()));
                }
                match (self.device.failure(), self.booth.camera_attempt()) {
                    (Some(reason), Some(attempt)) => self.camera_lost(attempt, reason),
                    _ => Task::none(),
                }
            }
            Message::Shutter => match self.device.snapshot() {
                Ok(image) => {
                    info!("🖼️  Photo ready ({:?}, {})", image.origin, image.image.mime_type());
                    self.device.close();
                    self.preview = None;
                    self.dispatch(Event::ImageReady(image))
                }
                Err(e) => {
                    warn!("⚠️  Snapshot failed: {}", e);
                    match self.booth.camera_attempt() {
                        Some(attempt) => self.camera_lost(attempt, e.to_string()),
                        None => Task::none(),
                    }
                }
            },
            Message::CancelCapture => self.dispatch(Event::CancelCapture),
            Message::Retake => self.dispatch(Event::Retake),
            Message::SelectScene(id) => self.dispatch(Event::SelectScene(id)),
            Message::Confirm => self.dispatch(Event::Confirm),
            Message::GenerationFinished(request, outcome) => {
                if self.booth.pending_request() != Some(request) {
                    debug!("Discarding stale generation result for request {}", request);
                    return Task::none();
                }
                match outcome {
                    Ok(result) => self.dispatch(Event::Generated { request, result }),
                    Err(e) => {
                        error!("❌ Generation failed: {}", e.report());
                        self.dispatch(Event::GenerationFailed {
                            request,
                            message: e.user_message(),
                        })
                    }
                }
            }
            Message::SpinnerTick => {
                self.spinner.advance();
                Task::none()
            }
            Message::TryAnother => self.dispatch(Event::TryAnother),
            Message::Download => {
                let Some(result) = self.booth.result() else {
                    return Task::none();
                };
                match export::pick_destination(result) {
                    Some(path) => Task::perform(export::save_result(result.clone(), path), |saved| {
                        Message::Saved(saved.map_err(Arc::new))
                    }),
                    None => Task::none(),
                }
            }
            Message::Saved(Ok(path)) => {
                self.notice = Some(format!("Saved to {}", path.display()));
                Task::none()
            }
            Message::Saved(Err(e)) => {
                error!("❌ Save failed: {}", e.report());
                self.notice = Some(e.user_message());
                Task::none()
            }
            Message::Reset => self.dispatch(Event::Reset),
        }
    }

    /// Run one event through the state machine and carry out its effects
    fn dispatch(&mut self, event: Event) -> Task<Message> {
        let before = self.booth.step();
        let (booth, effects) = std::mem::take(&mut self.booth).apply(event);
        self.booth = booth;

        if self.booth.step() != before {
            debug!("Step {:?} -> {:?}", before, self.booth.step());
            self.notice = None;
        }
        self.refresh_handles();

        Task::batch(effects.into_iter().map(|effect| self.run_effect(effect)))
    }

    fn run_effect(&mut self, effect: Effect) -> Task<Message> {
        match effect {
            Effect::OpenCamera { attempt } => {
                Task::perform(self.device.acquire_in_background(), move |opened| {
                    Message::CameraOpened(
                        attempt,
                        opened.map(SessionHandoff::new).map_err(Arc::new),
                    )
                })
            }
            Effect::CloseCamera => {
                self.device.close();
                self.preview = None;
                Task::none()
            }
            Effect::Generate(job) => {
                let generator = Arc::clone(&self.generator);
                let request = job.request;
                Task::perform(
                    async move { generator.generate(&job.image, job.scene).await },
                    move |outcome| Message::GenerationFinished(request, outcome.map_err(Arc::new)),
                )
            }
        }
    }

    /// The open camera stopped working: release it and show the error
    fn camera_lost(&mut self, attempt: Ticket, reason: String) -> Task<Message> {
        self.device.close();
        self.preview = None;
        self.dispatch(Event::CameraUnavailable { attempt, reason })
    }

    /// Rebuild image handles when the underlying images change
    fn refresh_handles(&mut self) {
        self.captured_handle = match (self.booth.captured(), self.captured_handle.take()) {
            (Some(image), Some((cached, handle))) if cached.is_same(image) => Some((cached, handle)),
            (Some(image), _) => Some((
                image.clone(),
                Handle::from_bytes(image.image.bytes().to_vec()),
            )),
            (None, _) => None,
        };

        self.result_handle = match (self.booth.result(), self.result_handle.take()) {
            (Some(result), Some((cached, handle))) if cached.is_same(&result.image) => {
                Some((cached, handle))
            }
            (Some(result), _) => Some((
                result.image.clone(),
                Handle::from_bytes(result.image.bytes().to_vec()),
            )),
            (None, _) => None,
        };
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        let step = self.booth.step();
        let captured = self.captured_handle.as_ref().map(|(_, handle)| handle);
        let generated = self.result_handle.as_ref().map(|(_, handle)| handle);

        let body = match (step, self.booth.result()) {
            (Step::Start, _) => ui::views::start(self.notice.as_deref()),
            (Step::Capturing, _) => {
                ui::views::capturing(self.preview.as_ref(), self.booth.device_error())
            }
            (Step::Configuring, _) => ui::views::configuring(
                captured,
                self.booth.selected_scene(),
                self.booth.error(),
            ),
            (Step::Processing, _) => {
                ui::views::processing(self.booth.selected_scene(), self.spinner)
            }
            (Step::Result, Some(result)) => {
                ui::views::result(generated, result, self.notice.as_deref())
            }
            (Step::Result, None) => ui::views::start(None),
        };

        container(column![ui::views::header(step != Step::Start), body])
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    fn subscription(&self) -> Subscription<Message> {
        match self.booth.step() {
            Step::Capturing => time::every(PREVIEW_INTERVAL).map(|_| Message::PreviewTick),
            Step::Processing => time::every(SPINNER_INTERVAL).map(|_| Message::SpinnerTick),
            _ => Subscription::none(),
        }
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

fn main() -> iced::Result {
    logging::init();

    iced::application("ChronoSnap", PhotoBooth::update, PhotoBooth::view)
        .subscription(PhotoBooth::subscription)
        .theme(PhotoBooth::theme)
        .centered()
        .run_with(PhotoBooth::new)
}
