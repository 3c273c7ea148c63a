//! Photo suitability gate, run before any generation is paid for.

use super::error::SimulationError;
use crate::generative::prompts::{validation_request, REJECTION_MESSAGE};
use crate::generative::{ImageModel, ModelError};
use crate::imaging::DataUri;
use crate::server::metrics;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    /// Carries the message shown to the user.
    Rejected(String),
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted)
    }

    fn label(&self) -> &'static str {
        match self {
            Verdict::Accepted => "accepted",
            Verdict::Rejected(_) => "rejected",
        }
    }
}

/// Rejects only on an explicit, case-insensitive "FALSE" anywhere in the answer.
pub fn classify(answer: &str) -> Verdict {
    if answer.to_uppercase().contains("FALSE") {
        Verdict::Rejected(REJECTION_MESSAGE.to_string())
    } else {
        Verdict::Accepted
    }
}

#[derive(Clone)]
pub struct ValidationGate {
    model: Arc<dyn ImageModel>,
}

impl ValidationGate {
    pub fn new(model: Arc<dyn ImageModel>) -> Self {
        Self { model }
    }

    /// Asks the model whether `photo` shows a scalp, hair or head.
    ///
    /// An unreadable or empty answer counts as accepted; transport and
    /// credential failures are returned as errors.
    pub async fn validate(&self, photo: &DataUri, api_key: &str) -> Result<Verdict, SimulationError> {
        let request = validation_request(photo);
        let answer = match self.model.generate_content(&request, api_key).await {
            Ok(response) => response.text(),
            Err(ModelError::InvalidResponse(detail)) => {
                warn!("Unreadable validation answer, accepting photo: {}", detail);
                String::new()
            }
            Err(e) => return Err(e.into()),
        };

        let verdict = classify(&answer);
        debug!("Validation answer {:?}", answer.trim());
        info!("Photo validation verdict: {}", verdict.label());
        metrics::record_validation(verdict.label());
        Ok(verdict)
    }
}
