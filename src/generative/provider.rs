//! Image model trait definition.

use super::types::{ContentRequest, ModelResponse};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Default timeout for a single model round trip.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Errors that can occur when calling an image model.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Request timeout")]
    Timeout,
}

/// A generative model that accepts interleaved text and images.
///
/// Implementations are shared across requests, so the credential is passed
/// per call rather than held by the provider.
#[async_trait]
pub trait ImageModel: Send + Sync {
    /// Get the provider's name (e.g., "gemini").
    fn name(&self) -> &str;

    /// Get the model being used.
    fn model(&self) -> &str;

    /// Send one multi-part turn and return the parts of the first candidate.
    async fn generate_content(
        &self,
        request: &ContentRequest,
        api_key: &str,
    ) -> Result<ModelResponse, ModelError>;
}
