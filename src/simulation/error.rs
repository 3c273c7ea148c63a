use super::state::SimulationState;
use crate::generative::ModelError;
use crate::imaging::RasterError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::warn;

/// Shown for any model failure other than a credential problem.
pub const GENERATION_FAILED_MESSAGE: &str = "Failed to generate simulation, please try again.";

/// Shown when the model answered without any image part.
pub const NO_IMAGE_MESSAGE: &str = "AI failed to generate results";

pub const MISSING_KEY_MESSAGE: &str = "API Key not found";

#[derive(Debug, Error)]
pub enum SimulationError {
    /// Missing or refused model credential.
    #[error("{0}")]
    Configuration(String),

    /// The photo is not something we can simulate on.
    #[error("{0}")]
    ValidationRejected(String),

    #[error("{0}")]
    Generation(String),

    #[error("{0}")]
    InvalidRequest(String),

    #[error("Invalid simulation state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: SimulationState,
        to: SimulationState,
    },

    #[error("{0}")]
    Internal(String),
}

impl SimulationError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            SimulationError::Configuration(_) => StatusCode::UNAUTHORIZED,
            SimulationError::ValidationRejected(_) | SimulationError::InvalidRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            SimulationError::Generation(_)
            | SimulationError::InvalidTransition { .. }
            | SimulationError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Label used for the outcome metric.
    pub fn kind(&self) -> &'static str {
        match self {
            SimulationError::Configuration(_) => "configuration",
            SimulationError::ValidationRejected(_) => "rejected",
            SimulationError::Generation(_) => "generation_failed",
            SimulationError::InvalidRequest(_) => "invalid_request",
            SimulationError::InvalidTransition { .. } => "invalid_transition",
            SimulationError::Internal(_) => "internal",
        }
    }
}

impl From<ModelError> for SimulationError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::Unauthorized(detail) => {
                warn!("Model refused credential: {}", detail);
                SimulationError::Configuration("API Key rejected by the model service".to_string())
            }
            other => {
                warn!("Model call failed: {}", other);
                SimulationError::Generation(GENERATION_FAILED_MESSAGE.to_string())
            }
        }
    }
}

impl From<RasterError> for SimulationError {
    fn from(err: RasterError) -> Self {
        match err {
            RasterError::DataUri(e) => SimulationError::InvalidRequest(e.to_string()),
            other => SimulationError::Generation(other.to_string()),
        }
    }
}

impl IntoResponse for SimulationError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (
            status,
            Json(json!({ "success": false, "error": self.to_string() })),
        )
            .into_response()
    }
}
