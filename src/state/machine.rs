/// The photo booth flow as a pure state machine
///
/// `Booth::apply` maps `(state, event)` to `(new state, effects)`. It never
/// touches the camera or the network itself: the effects it returns tell the
/// shell what to start or release. Each phase carries exactly the data it is
/// valid with, so e.g. a `Result` without a generated image cannot be built.
use crate::error::GENERATION_RETRY_MESSAGE;
use crate::scenes::{self, Scene};
use crate::state::data::{CapturedImage, GeneratedResult};

/// Monotonic number identifying a camera attempt or a generation request
pub type Ticket = u64;

/// Which screen of the flow is active
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Start,
    Capturing,
    Configuring,
    Processing,
    Result,
}

#[derive(Debug, Clone)]
enum Phase {
    Start,
    Capturing {
        attempt: Ticket,
        device_error: Option<String>,
    },
    Configuring {
        image: CapturedImage,
        scene: Option<&'static Scene>,
        error: Option<String>,
    },
    Processing {
        image: CapturedImage,
        scene: &'static Scene,
        request: Ticket,
    },
    Result {
        result: GeneratedResult,
    },
}

/// Something that happened: a user intent or an I/O completion
#[derive(Debug, Clone)]
pub enum Event {
    /// "Take Photo" on the start screen
    TakePhoto,
    /// The camera for `attempt` could not be acquired or stopped working
    CameraUnavailable { attempt: Ticket, reason: String },
    /// A photo is ready, from the shutter or a finished upload
    ImageReady(CapturedImage),
    /// Close button in the capture view
    CancelCapture,
    /// "Retake / Change Photo"
    Retake,
    /// A scene card was clicked (by scene id)
    SelectScene(&'static str),
    /// "Activate Time Machine"
    Confirm,
    Generated {
        request: Ticket,
        result: GeneratedResult,
    },
    GenerationFailed {
        request: Ticket,
        message: String,
    },
    /// "Try Another Era"
    TryAnother,
    Reset,
}

/// Work the shell must carry out after a transition
#[derive(Debug, Clone)]
pub enum Effect {
    OpenCamera { attempt: Ticket },
    /// Release the camera (idempotent on the device side)
    CloseCamera,
    Generate(GenerationJob),
}

/// A generation request to run in the background
#[derive(Debug, Clone)]
pub struct GenerationJob {
    pub request: Ticket,
    pub image: CapturedImage,
    pub scene: &'static Scene,
}

/// Complete application state
#[derive(Debug, Clone)]
pub struct Booth {
    phase: Phase,
    /// Last ticket handed out; never reset so stale completions stay stale
    last_ticket: Ticket,
}

impl Default for Booth {
    fn default() -> Self {
        Self::new()
    }
}

impl Booth {
    pub fn new() -> Self {
        Booth {
            phase: Phase::Start,
            last_ticket: 0,
        }
    }

    /// Apply one event, returning the next state and the effects to run
    pub fn apply(self, event: Event) -> (Booth, Vec<Effect>) {
        let Booth {
            phase,
            mut last_ticket,
        } = self;
        let was_capturing = matches!(phase, Phase::Capturing { .. });
        let mut effects = Vec::new();

        let next = match (phase, event) {
            (_, Event::Reset) => Phase::Start,

            (Phase::Start, Event::TakePhoto) => {
                last_ticket += 1;
                effects.push(Effect::OpenCamera {
                    attempt: last_ticket,
                });
                Phase::Capturing {
                    attempt: last_ticket,
                    device_error: None,
                }
            }

            (Phase::Capturing { attempt, .. }, Event::CameraUnavailable { attempt: failed, reason })
                if failed == attempt =>
            {
                Phase::Capturing {
                    attempt,
                    device_error: Some(reason),
                }
            }

            (Phase::Start | Phase::Capturing { .. }, Event::ImageReady(image)) => {
                Phase::Configuring {
                    image,
                    scene: None,
                    error: None,
                }
            }

            (Phase::Capturing { .. }, Event::CancelCapture) => Phase::Start,

            (Phase::Configuring { .. }, Event::Retake) => Phase::Start,

            (Phase::Configuring { image, scene, error }, Event::SelectScene(id)) => {
                Phase::Configuring {
                    image,
                    scene: scenes::find(id).or(scene),
                    error,
                }
            }

            (Phase::Configuring { image, scene: Some(scene), .. }, Event::Confirm) => {
                last_ticket += 1;
                effects.push(Effect::Generate(GenerationJob {
                    request: last_ticket,
                    image: image.clone(),
                    scene,
                }));
                Phase::Processing {
                    image,
                    scene,
                    request: last_ticket,
                }
            }

            (Phase::Processing { image, scene, request }, Event::Generated { request: done, result })
                if done == request =>
            {
                if result.matches(&image, scene) {
                    Phase::Result { result }
                } else {
                    Phase::Configuring {
                        image,
                        scene: Some(scene),
                        error: Some(GENERATION_RETRY_MESSAGE.to_string()),
                    }
                }
            }

            (Phase::Processing { image, scene, request }, Event::GenerationFailed { request: done, message })
                if done == request =>
            {
                Phase::Configuring {
                    image,
                    scene: Some(scene),
                    error: Some(message),
                }
            }

            (Phase::Result { result }, Event::TryAnother) => Phase::Configuring {
                image: result.source,
                scene: Some(result.scene),
                error: None,
            },

            // Anything else does not apply to the current phase
            (phase, _) => phase,
        };

        if was_capturing && !matches!(next, Phase::Capturing { .. }) {
            effects.push(Effect::CloseCamera);
        }

        (
            Booth {
                phase: next,
                last_ticket,
            },
            effects,
        )
    }

    pub fn step(&self) -> Step {
        match self.phase {
            Phase::Start => Step::Start,
            Phase::Capturing { .. } => Step::Capturing,
            Phase::Configuring { .. } => Step::Configuring,
            Phase::Processing { .. } => Step::Processing,
            Phase::Result { .. } => Step::Result,
        }
    }

    pub fn captured(&self) -> Option<&CapturedImage> {
        match &self.phase {
            Phase::Configuring { image, .. } | Phase::Processing { image, .. } => Some(image),
            Phase::Result { result } => Some(&result.source),
            Phase::Start | Phase::Capturing { .. } => None,
        }
    }

    pub fn selected_scene(&self) -> Option<&'static Scene> {
        match &self.phase {
            Phase::Configuring { scene, .. } => *scene,
            Phase::Processing { scene, .. } => Some(scene),
            Phase::Result { result } => Some(result.scene),
            Phase::Start | Phase::Capturing { .. } => None,
        }
    }

    pub fn result(&self) -> Option<&GeneratedResult> {
        match &self.phase {
            Phase::Result { result } => Some(result),
            _ => None,
        }
    }

    /// Last generation error, shown on the configuring screen
    pub fn error(&self) -> Option<&str> {
        match &self.phase {
            Phase::Configuring { error, .. } => error.as_deref(),
            _ => None,
        }
    }

    /// Why the camera could not be used, if it could not
    pub fn device_error(&self) -> Option<&str> {
        match &self.phase {
            Phase::Capturing { device_error, .. } => device_error.as_deref(),
            _ => None,
        }
    }

    /// The camera attempt a freshly opened session must belong to
    pub fn camera_attempt(&self) -> Option<Ticket> {
        match &self.phase {
            Phase::Capturing {
                attempt,
                device_error: None,
            } => Some(*attempt),
            _ => None,
        }
    }

    /// The generation request whose completion will be applied
    pub fn pending_request(&self) -> Option<Ticket> {
        match &self.phase {
            Phase::Processing { request, .. } => Some(*request),
            _ => None,
        }
    }
}
