//! GeminiImageClient - REST client for Gemini image generation.
//!
//! Calls `generateContent` directly and turns the first inline image of the
//! response into a data URI. The API key comes from the environment or
//! `secret.json`.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use reqwest::{Client, StatusCode, header::HeaderValue};
use serde::{Deserialize, Serialize};
use studio_core::config::{DEFAULT_IMAGE_MODEL, StudioConfig};
use studio_core::error::{GenerationError, Result};
use studio_core::generation::{
    ImageGenerator, InlineImage, TryOnRequest, TurnaroundRequest, sniff_mime_type,
};
use studio_core::image::ImageRef;
use studio_core::prompt::{self, AspectRatio};
use studio_infrastructure::storage::SecretStorage;

/// Image generator backed by the Gemini HTTP API.
#[derive(Clone)]
pub struct GeminiImageClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiImageClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: studio_core::config::DEFAULT_API_BASE_URL.to_string(),
        }
    }

    /// Builds a client from configuration and the resolved API key.
    ///
    /// Model precedence: `model_override`, then `config.toml`, then
    /// `secret.json`, then the default image model.
    pub fn from_config(
        config: &StudioConfig,
        secrets: &SecretStorage,
        model_override: Option<&str>,
    ) -> std::result::Result<Self, GenerationError> {
        let credential = secrets
            .resolve_api_key()
            .ok_or(GenerationError::MissingApiKey)?;

        let model = model_override
            .map(str::to_string)
            .or_else(|| config.generation.model.clone())
            .or(credential.model_name)
            .unwrap_or_else(|| DEFAULT_IMAGE_MODEL.to_string());

        tracing::info!("[GeminiImageClient] Using model {}", model);
        Ok(Self::new(credential.api_key, model).with_base_url(config.generation.base_url_or_default()))
    }

    /// Points the client at a different API root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request(parts: Vec<Part>, aspect_ratio: AspectRatio) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts,
            }],
            generation_config: GenerationConfig {
                response_modalities: vec!["IMAGE".to_string(), "TEXT".to_string()],
                image_config: ImageConfig {
                    aspect_ratio: aspect_ratio.as_str().to_string(),
                },
            },
        }
    }

    async fn send_request(
        &self,
        body: &GenerateContentRequest,
    ) -> std::result::Result<ImageRef, GenerationError> {
        let url = format!(
            "{}/{model}:generateContent?key={api_key}",
            self.base_url,
            model = self.model,
            api_key = self.api_key
        );

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|err| {
                GenerationError::Transport(format!("Gemini API request failed: {}", err.without_url()))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let retry_after = parse_retry_after(response.headers().get("retry-after"));
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Gemini error body".to_string());
            return Err(map_http_error(status, body_text, retry_after));
        }

        let parsed: GenerateContentResponse = response.json().await.map_err(|err| {
            GenerationError::Transport(format!("Failed to parse Gemini response: {}", err.without_url()))
        })?;

        extract_image(parsed)
    }
}

fn inline_part(image: InlineImage) -> Part {
    Part::InlineData {
        inline_data: InlineDataPayload {
            mime_type: image.mime_type,
            data: image.data,
        },
    }
}

#[async_trait]
impl ImageGenerator for GeminiImageClient {
    async fn generate_item(&self, description: &str) -> Result<ImageRef> {
        tracing::debug!("[GeminiImageClient] Generating item: {}", description);
        let request = Self::request(
            vec![Part::Text {
                text: prompt::item_prompt(description),
            }],
            AspectRatio::Square,
        );
        Ok(self.send_request(&request).await?)
    }

    async fn generate_try_on(&self, request: TryOnRequest) -> Result<ImageRef> {
        tracing::debug!(
            "[GeminiImageClient] Generating try-on: {} / {} ({}, {})",
            request.category,
            request.item_type,
            request.variation.pose,
            request.variation.angle
        );
        let text = prompt::try_on_prompt(request.category, request.item_type, &request.variation);
        let body = Self::request(
            vec![
                inline_part(request.subject),
                inline_part(request.item),
                Part::Text { text },
            ],
            AspectRatio::Portrait,
        );
        Ok(self.send_request(&body).await?)
    }

    async fn generate_turnaround(&self, request: TurnaroundRequest) -> Result<ImageRef> {
        tracing::debug!("[GeminiImageClient] Generating turnaround for {}", request.category);
        let text = prompt::turnaround_prompt(request.category);
        let body = Self::request(
            vec![
                inline_part(request.subject),
                inline_part(request.item),
                Part::Text { text },
            ],
            AspectRatio::Wide,
        );
        Ok(self.send_request(&body).await?)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineDataPayload,
    },
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineDataPayload {
    #[serde(default)]
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: Vec<String>,
    image_config: ImageConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageConfig {
    aspect_ratio: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PartResponse {
    text: Option<String>,
    inline_data: Option<InlineDataPayload>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

/// Picks the first inline image of the first candidate.
///
/// Without an image, any text the model produced is kept as the refusal.
fn extract_image(
    response: GenerateContentResponse,
) -> std::result::Result<ImageRef, GenerationError> {
    let block_reason = response.prompt_feedback.and_then(|feedback| feedback.block_reason);
    let parts = response
        .candidates
        .and_then(|candidates| candidates.into_iter().next())
        .and_then(|candidate| candidate.content)
        .map(|content| content.parts)
        .unwrap_or_default();

    let mut refusal = None;
    for part in parts {
        if let Some(inline) = part.inline_data {
            return decode_inline(inline);
        }
        if refusal.is_none() {
            refusal = part.text.filter(|text| !text.trim().is_empty());
        }
    }

    let refusal = refusal.or(block_reason);
    if let Some(text) = &refusal {
        tracing::warn!("[GeminiImageClient] Model returned text instead of an image: {}", text);
    }
    Err(GenerationError::NoImageProduced { refusal })
}

fn decode_inline(inline: InlineDataPayload) -> std::result::Result<ImageRef, GenerationError> {
    let bytes = BASE64_STANDARD
        .decode(inline.data.as_bytes())
        .map_err(|err| GenerationError::UnusableImage(format!("invalid base64 payload: {err}")))?;
    if bytes.is_empty() {
        return Err(GenerationError::UnusableImage("empty image payload".into()));
    }

    let mime_type = if inline.mime_type.is_empty() {
        sniff_mime_type(&inline.data).to_string()
    } else {
        inline.mime_type
    };
    Ok(ImageRef::from_base64(&mime_type, &inline.data))
}

fn map_http_error(
    status: StatusCode,
    body: String,
    retry_after: Option<Duration>,
) -> GenerationError {
    let mut message = serde_json::from_str::<ErrorWrapper>(&body)
        .map(|wrapper| {
            let status_text = wrapper.error.status.unwrap_or_default();
            let msg = wrapper.error.message.unwrap_or_else(|| body.clone());
            if status_text.is_empty() {
                msg
            } else {
                format!("{status_text}: {msg}")
            }
        })
        .unwrap_or_else(|_| body.clone());

    let retryable = matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    );

    if let Some(delay) = retry_after {
        message = format!("{message} (retry after {}s)", delay.as_secs());
    }

    GenerationError::Service {
        status: status.as_u16(),
        message,
        retryable,
    }
}

fn parse_retry_after(header: Option<&HeaderValue>) -> Option<Duration> {
    let value = header?.to_str().ok()?;
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}
