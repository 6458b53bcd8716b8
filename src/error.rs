/// Error types shared by the capture, generation and export paths
use thiserror::Error;

/// Message shown for any failure on the generation path
pub const GENERATION_RETRY_MESSAGE: &str = "The time machine malfunctioned! Please try again.";

/// Message shown when the camera cannot be acquired
pub const CAMERA_DENIED_MESSAGE: &str = "Could not access camera. Please check permissions.";

/// Everything that can go wrong between the camera and the saved result
#[derive(Debug, Error)]
pub enum BoothError {
    /// Camera permission denied, no compatible device, or the device died
    #[error("camera unavailable: {0}")]
    DeviceUnavailable(String),

    /// A snapshot was requested while no camera session is open
    #[error("camera is not open")]
    NotOpen,

    /// No API key was configured at startup
    #[error("no API key configured (set {})", crate::config::API_KEY_VAR)]
    MissingCredential,

    /// Transport or service error while talking to the image model
    #[error("generation request failed: {message}")]
    GenerationFailed {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The service answered, but none of the returned parts carried an image
    #[error("no image in generation response")]
    NoImageInResponse,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An uploaded file that is not a recognizable image
    #[error("unsupported image: {0}")]
    UnsupportedImage(String),

    #[error("failed to encode image: {0}")]
    Encode(#[from] image::ImageError),
}

impl BoothError {
    /// Wrap a lower-level error as a generation failure, keeping it as the cause
    pub fn generation<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        BoothError::GenerationFailed {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Text shown to the user for this error
    ///
    /// Both generation-path failures read the same; the distinction only
    /// matters in the logs.
    pub fn user_message(&self) -> String {
        match self {
            BoothError::GenerationFailed { .. } | BoothError::NoImageInResponse => {
                GENERATION_RETRY_MESSAGE.to_string()
            }
            BoothError::MissingCredential => format!(
                "No API key configured. Set {} and restart ChronoSnap.",
                crate::config::API_KEY_VAR
            ),
            BoothError::DeviceUnavailable(_) | BoothError::NotOpen => {
                CAMERA_DENIED_MESSAGE.to_string()
            }
            BoothError::UnsupportedImage(_) => {
                "That file doesn't look like a photo. Try a JPEG, PNG or WebP.".to_string()
            }
            BoothError::Io(e) => format!("Could not read or write the file: {}", e),
            BoothError::Encode(e) => format!("Could not encode the image: {}", e),
        }
    }

    /// Render the error together with its cause chain, for logs
    pub fn report(&self) -> String {
        let mut out = self.to_string();
        let mut cause = std::error::Error::source(self);
        while let Some(err) = cause {
            out.push_str(": ");
            out.push_str(&err.to_string());
            cause = err.source();
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_errors_share_user_message() {
        let failed = BoothError::GenerationFailed {
            message: "503".to_string(),
            source: None,
        };
        assert_eq!(failed.user_message(), BoothError::NoImageInResponse.user_message());
        assert_eq!(failed.user_message(), GENERATION_RETRY_MESSAGE);
    }

    #[test]
    fn test_missing_credential_is_distinct() {
        let msg = BoothError::MissingCredential.user_message();
        assert_ne!(msg, GENERATION_RETRY_MESSAGE);
        assert!(msg.contains(crate::config::API_KEY_VAR));
    }

    #[test]
    fn test_report_includes_cause() {
        let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "deadline elapsed");
        let err = BoothError::generation("request timed out", io);
        let report = err.report();
        assert!(report.contains("request timed out"));
        assert!(report.contains("deadline elapsed"));
    }
}
