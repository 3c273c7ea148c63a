//! Deterministic model stub for unit tests.

use crate::generative::prompts::VALIDATION_PROMPT;
use crate::generative::{ContentPart, ContentRequest, ImageModel, ModelError, ModelResponse};
use crate::imaging::DataUri;
use async_trait::async_trait;
use std::sync::Mutex;

#[derive(Debug, Clone)]
pub enum Reply {
    Response(ModelResponse),
    Unauthorized,
    Timeout,
    InvalidResponse,
}

impl Reply {
    pub fn text(text: &str) -> Self {
        Reply::Response(ModelResponse::new(vec![ContentPart::text(text)]))
    }

    pub fn image(image: DataUri) -> Self {
        Reply::Response(ModelResponse::new(vec![
            ContentPart::text("Here is the simulation"),
            ContentPart::image(image),
        ]))
    }

    fn produce(&self) -> Result<ModelResponse, ModelError> {
        match self {
            Reply::Response(response) => Ok(response.clone()),
            Reply::Unauthorized => Err(ModelError::Unauthorized("invalid key".to_string())),
            Reply::Timeout => Err(ModelError::Timeout),
            Reply::InvalidResponse => Err(ModelError::InvalidResponse("garbled".to_string())),
        }
    }
}

/// Answers validation prompts with one reply and everything else with another,
/// recording every request and key it sees.
pub struct ScriptedModel {
    validation: Reply,
    generation: Reply,
    calls: Mutex<Vec<(ContentRequest, String)>>,
}

impl ScriptedModel {
    pub fn new(validation: Reply, generation: Reply) -> Self {
        Self {
            validation,
            generation,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<ContentRequest> {
        self.calls.lock().unwrap().iter().map(|(r, _)| r.clone()).collect()
    }

    pub fn keys(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(_, k)| k.clone()).collect()
    }
}

#[async_trait]
impl ImageModel for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }

    async fn generate_content(
        &self,
        request: &ContentRequest,
        api_key: &str,
    ) -> Result<ModelResponse, ModelError> {
        self.calls
            .lock()
            .unwrap()
            .push((request.clone(), api_key.to_string()));
        let is_validation = request.parts.first().and_then(ContentPart::as_text) == Some(VALIDATION_PROMPT);
        if is_validation {
            self.validation.produce()
        } else {
            self.generation.produce()
        }
    }
}
