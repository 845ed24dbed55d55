use super::client::GeminiHttpClient;
use super::types::{Content, GenerateContentResponse, InlineData, Part};
use crate::ai::{response, ImageApi};
use crate::models::{Config, ImagePayload, DEFAULT_TIMEOUT_SECS};
use crate::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Serialize)]
struct ImageRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: ImageGenerationConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageGenerationConfig {
    response_modalities: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_config: Option<ImageConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageConfig {
    aspect_ratio: String,
}

/// Gemini image model client. Generation sends the prompt alone; edits send
/// the current image as inline data followed by the prompt.
pub struct GeminiImageClient {
    http: GeminiHttpClient,
    aspect_ratio: Option<String>,
}

impl GeminiImageClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self::new_with_client(api_key, model, reqwest::Client::new())
    }

    pub fn new_with_client(api_key: String, model: String, client: reqwest::Client) -> Self {
        Self {
            http: GeminiHttpClient::new_with_client(
                api_key,
                model,
                Duration::from_secs(DEFAULT_TIMEOUT_SECS),
                client,
            ),
            aspect_ratio: None,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            http: GeminiHttpClient::new(
                config.api_key.clone(),
                config.image_model.clone(),
                config.timeout,
            )
            .with_base_url(config.base_url.clone()),
            aspect_ratio: config.aspect_ratio.clone(),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.http = self.http.with_base_url(base_url);
        self
    }

    pub fn with_aspect_ratio(mut self, aspect_ratio: impl Into<String>) -> Self {
        self.aspect_ratio = Some(aspect_ratio.into());
        self
    }

    pub fn model(&self) -> &str {
        self.http.model()
    }

    fn build_request(&self, parts: Vec<Part>) -> ImageRequest {
        ImageRequest {
            contents: vec![Content { role: None, parts }],
            generation_config: ImageGenerationConfig {
                response_modalities: vec!["TEXT".to_string(), "IMAGE".to_string()],
                image_config: self.aspect_ratio.clone().map(|aspect_ratio| ImageConfig {
                    aspect_ratio,
                }),
            },
        }
    }

    async fn request_image(&self, request: ImageRequest) -> Result<ImagePayload> {
        let gemini_response: GenerateContentResponse = self.http.generate_content(&request).await?;

        if gemini_response.candidates.is_empty() {
            if let Some(reason) = gemini_response
                .prompt_feedback
                .as_ref()
                .and_then(|f| f.block_reason.as_deref())
            {
                tracing::warn!("Gemini blocked the prompt: {}", reason);
            }
        } else if let Some(reason) = gemini_response.candidates[0].finish_reason.as_deref() {
            tracing::debug!("Gemini finish reason: {}", reason);
        }

        response::extract_image(&gemini_response.into_candidates())
    }
}

#[async_trait]
impl ImageApi for GeminiImageClient {
    async fn generate(&self, prompt: &str) -> Result<ImagePayload> {
        tracing::debug!("Requesting image generation from Gemini ({})", self.model());

        let request = self.build_request(vec![Part::Text {
            text: prompt.to_string(),
        }]);

        self.request_image(request).await.map_err(|e| {
            tracing::error!("Error generating image: {}", e);
            e
        })
    }

    async fn edit(&self, image: &ImagePayload, prompt: &str) -> Result<ImagePayload> {
        tracing::debug!(
            "Requesting image edit from Gemini ({}, {} bytes of {})",
            self.model(),
            image.len(),
            image.media_type()
        );

        let request = self.build_request(vec![
            Part::InlineData {
                inline_data: InlineData {
                    mime_type: image.media_type().to_string(),
                    data: image.to_base64(),
                },
            },
            Part::Text {
                text: prompt.to_string(),
            },
        ]);

        self.request_image(request).await.map_err(|e| {
            tracing::error!("Error editing image: {}", e);
            e
        })
    }
}
