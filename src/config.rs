/// Startup configuration
///
/// The only value read from the environment is the API credential. Everything
/// else is a constant of the build.
use std::time::Duration;

/// Environment variable holding the image model API key
pub const API_KEY_VAR: &str = "API_KEY";

/// Image editing model used for every generation
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-image";

/// Base URL of the generative language API
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Generation can take tens of seconds; anything past this is treated as failed
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Application configuration, read once at startup
#[derive(Clone)]
pub struct Config {
    /// API key for the image model (None if not configured)
    pub api_key: Option<String>,
    pub model: String,
    pub endpoint: String,
    pub request_timeout: Duration,
    /// Index of the camera device to open
    pub camera_index: i32,
}

impl Config {
    /// Read configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(API_KEY_VAR)
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());

        Config {
            api_key,
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            request_timeout: REQUEST_TIMEOUT,
            camera_index: 0,
        }
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }
}

// Never print the key itself
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("request_timeout", &self.request_timeout)
            .field("camera_index", &self.camera_index)
            .finish()
    }
}
