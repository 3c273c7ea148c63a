//! Generative image model abstraction layer.
//!
//! The simulation talks to [`ImageModel`]; [`GeminiProvider`] is the HTTP
//! implementation and tests inject deterministic stubs.

mod credentials;
mod gemini;
pub mod prompts;
mod provider;
mod types;

pub use credentials::{ApiKeySource, API_KEY_ENV_VAR};
pub use gemini::{GeminiProvider, DEFAULT_API_BASE, DEFAULT_MODEL};
pub use provider::{ImageModel, ModelError, DEFAULT_REQUEST_TIMEOUT};
pub use types::{ContentPart, ContentRequest, ModelResponse};
