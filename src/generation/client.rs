use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::Utc;
use reqwest::Client;
use std::time::Instant;
use tracing::{debug, info};

use super::wire::{Content, GenerateRequest, GenerateResponse, Part};
use crate::config::Config;
use crate::error::BoothError;
use crate::scenes::Scene;
use crate::state::{CapturedImage, EncodedImage, GeneratedResult};

/// MIME type assumed when the service does not declare one
const FALLBACK_MIME: &str = "image/png";

/// How much of an error body to keep in the failure message
const ERROR_BODY_LIMIT: usize = 300;

/// Talks to the external image model
#[derive(Clone)]
pub struct GenerationClient {
    http: Client,
    api_key: Option<String>,
    model: String,
    endpoint: String,
}

impl GenerationClient {
    pub fn new(config: &Config) -> Result<Self, BoothError> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| BoothError::generation("failed to build HTTP client", e))?;

        Ok(GenerationClient {
            http,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }

    /// Send the photo into `scene` and return the stylized image
    ///
    /// One request, no retries. Without an API key this fails with
    /// `MissingCredential` before touching the network.
    pub async fn generate(
        &self,
        image: &CapturedImage,
        scene: &'static Scene,
    ) -> Result<GeneratedResult, BoothError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(BoothError::MissingCredential)?;

        let body = build_request(&image.image, scene.prompt_fragment);
        info!(
            "🕰️  Sending {} KB photo to {} for '{}'",
            image.image.bytes().len() / 1024,
            self.model,
            scene.id
        );
        let started = Instant::now();

        let response = self
            .http
            .post(self.url())
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| BoothError::generation("request to image model failed", e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(BoothError::GenerationFailed {
                message: format!(
                    "image model returned {}: {}",
                    status,
                    truncate(&text, ERROR_BODY_LIMIT)
                ),
                source: None,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| BoothError::generation("could not decode image model response", e))?;

        let generated = extract_image(&parsed)?;
        info!(
            "✅ Arrived in '{}' after {:.1}s ({} KB, {})",
            scene.id,
            started.elapsed().as_secs_f32(),
            generated.bytes().len() / 1024,
            generated.mime_type()
        );

        Ok(GeneratedResult {
            image: generated,
            scene,
            created_at: Utc::now(),
            source: image.clone(),
        })
    }
}

impl std::fmt::Debug for GenerationClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationClient")
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("has_api_key", &self.api_key.is_some())
            .finish()
    }
}

/// The instruction sent alongside the photo
pub fn compose_instruction(prompt_fragment: &str) -> String {
    format!(
        "Edit this image to place the person {}. Ensure the face remains recognizable but \
         matches the lighting and style of the scene. The output should be a high-quality, \
         photorealistic image.",
        prompt_fragment
    )
}

/// Request body: the photo as bare base64, then the instruction
pub fn build_request(image: &EncodedImage, prompt_fragment: &str) -> GenerateRequest {
    GenerateRequest {
        contents: vec![Content {
            parts: vec![
                Part::inline(image.mime_type(), BASE64.encode(image.bytes())),
                Part::text(compose_instruction(prompt_fragment)),
            ],
        }],
    }
}

/// Drop a `data:<mime>;base64,` prefix if one is present
pub fn strip_data_url_prefix(payload: &str) -> &str {
    match payload.strip_prefix("data:") {
        Some(rest) => rest.split_once(',').map_or(payload, |(_, data)| data),
        None => payload,
    }
}

/// First part carrying inline image data, decoded
pub fn extract_image(response: &GenerateResponse) -> Result<EncodedImage, BoothError> {
    let inline = response
        .parts()
        .filter_map(|part| part.inline_data.as_ref())
        .find(|inline| !inline.data.is_empty())
        .ok_or_else(|| {
            let texts: Vec<&str> = response.parts().filter_map(|p| p.text.as_deref()).collect();
            debug!("No image in response; text parts: {:?}", texts);
            BoothError::NoImageInResponse
        })?;

    let bytes = BASE64
        .decode(strip_data_url_prefix(&inline.data))
        .map_err(|e| BoothError::generation("image data in response is not valid base64", e))?;

    let mime_type = inline
        .mime_type
        .as_deref()
        .filter(|mime| !mime.is_empty())
        .unwrap_or(FALLBACK_MIME);

    Ok(EncodedImage::new(bytes, mime_type))
}

fn truncate(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}
