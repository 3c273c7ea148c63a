//! Gemini `generateContent` provider.

use super::provider::{ImageModel, ModelError, DEFAULT_REQUEST_TIMEOUT};
use super::types::{ContentPart, ContentRequest, ModelResponse};
use crate::imaging::data_uri::{DataUri, DEFAULT_MIME_TYPE};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-image";

/// Calls `{api_base}/models/{model}:generateContent`.
pub struct GeminiProvider {
    client: Client,
    api_base: String,
    model: String,
    timeout: Duration,
}

impl GeminiProvider {
    /// # Arguments
    /// * `api_base` - Base URL of the API, without trailing slash.
    /// * `model` - Model to use (e.g., "gemini-2.5-flash-image").
    pub fn new(api_base: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            model: model.into(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_base, self.model)
    }

    fn to_gemini_request(request: &ContentRequest) -> GeminiRequest<'_> {
        GeminiRequest {
            contents: vec![GeminiContent {
                parts: request.parts.iter().map(GeminiPartOut::from).collect(),
            }],
        }
    }
}

#[async_trait]
impl ImageModel for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate_content(
        &self,
        request: &ContentRequest,
        api_key: &str,
    ) -> Result<ModelResponse, ModelError> {
        debug!(
            model = %self.model,
            part_count = request.parts.len(),
            image_count = request.image_count(),
            "Sending generateContent request"
        );

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&Self::to_gemini_request(request))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ModelError::Timeout
                } else {
                    ModelError::Connection(e.to_string())
                }
            })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ModelError::RateLimited);
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Unauthorized(body));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let gemini_response: GeminiResponse = response.json().await.map_err(|e| {
            ModelError::InvalidResponse(format!("Failed to parse Gemini response: {}", e))
        })?;

        let response = gemini_response.into_model_response();
        debug!(
            part_count = response.parts.len(),
            has_image = response.first_image().is_some(),
            "Received generateContent response"
        );
        Ok(response)
    }
}

// Gemini API types

#[derive(Debug, Serialize)]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    parts: Vec<GeminiPartOut<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiPartOut<'a> {
    Text {
        text: &'a str,
    },
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: GeminiBlobOut<'a>,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiBlobOut<'a> {
    mime_type: &'a str,
    data: &'a str,
}

impl<'a> From<&'a ContentPart> for GeminiPartOut<'a> {
    fn from(part: &'a ContentPart) -> Self {
        match part {
            ContentPart::Text(text) => GeminiPartOut::Text { text },
            ContentPart::InlineImage(image) => GeminiPartOut::Inline {
                inline_data: GeminiBlobOut {
                    mime_type: image.mime_type(),
                    data: image.payload(),
                },
            },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContentIn>,
}

#[derive(Debug, Deserialize)]
struct GeminiContentIn {
    #[serde(default)]
    parts: Vec<GeminiPartIn>,
}

#[derive(Debug, Deserialize)]
struct GeminiPartIn {
    #[serde(default)]
    text: Option<String>,
    #[serde(default, rename = "inlineData", alias = "inline_data")]
    inline_data: Option<GeminiBlobIn>,
}

#[derive(Debug, Deserialize)]
struct GeminiBlobIn {
    #[serde(default, rename = "mimeType", alias = "mime_type")]
    mime_type: String,
    #[serde(default)]
    data: String,
}

impl GeminiResponse {
    fn into_model_response(self) -> ModelResponse {
        let parts = self
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| content.parts)
            .unwrap_or_default();

        let parts = parts
            .into_iter()
            .filter_map(|part| match (part.inline_data, part.text) {
                (Some(blob), _) if !blob.data.is_empty() => {
                    let mime_type = if blob.mime_type.is_empty() {
                        DEFAULT_MIME_TYPE.to_string()
                    } else {
                        blob.mime_type
                    };
                    Some(ContentPart::InlineImage(DataUri::new(mime_type, blob.data)))
                }
                (_, Some(text)) => Some(ContentPart::Text(text)),
                _ => None,
            })
            .collect();

        ModelResponse::new(parts)
    }
}
