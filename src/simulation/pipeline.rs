//! End-to-end simulation: validate, mark up, generate, blend back.

use super::error::{SimulationError, MISSING_KEY_MESSAGE, NO_IMAGE_MESSAGE};
use super::state::{SimulationRun, SimulationState};
use super::validation::{ValidationGate, Verdict};
use crate::generative::prompts::simulation_request;
use crate::generative::{ApiKeySource, ImageModel};
use crate::imaging::{
    composite_or_fallback, prepare_ai_input, BackendKind, BufferBackend, CanvasBackend, DataUri,
};
use crate::reference::{Density, ReferenceCatalog};
use crate::server::metrics;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateRequest {
    pub patient_image: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulateRequest {
    pub patient_image: String,
    #[serde(default)]
    pub mask: Option<String>,
    #[serde(default)]
    pub density: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
}

fn parse_image(field: &str, value: &str) -> Result<DataUri, SimulationError> {
    DataUri::parse(value)
        .map_err(|e| SimulationError::InvalidRequest(format!("Invalid {}: {}", field, e)))
}

fn parse_density(value: Option<&str>) -> Result<Density, SimulationError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(Density::default()),
        Some(v) => v.parse().map_err(SimulationError::InvalidRequest),
    }
}

/// Runs simulation requests. Holds only shared, immutable collaborators, so
/// one instance serves any number of concurrent requests.
#[derive(Clone)]
pub struct Simulator {
    model: Arc<dyn ImageModel>,
    gate: ValidationGate,
    references: Option<ReferenceCatalog>,
    key_source: ApiKeySource,
    backend: BackendKind,
}

impl Simulator {
    pub fn new(
        model: Arc<dyn ImageModel>,
        references: Option<ReferenceCatalog>,
        key_source: ApiKeySource,
    ) -> Self {
        Self {
            gate: ValidationGate::new(model.clone()),
            model,
            references,
            key_source,
            backend: BackendKind::default(),
        }
    }

    pub fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    pub fn model_name(&self) -> &str {
        self.model.model()
    }

    /// Server key if configured, otherwise the caller's.
    async fn resolve_key(&self, provided: Option<&str>) -> Result<String, SimulationError> {
        if let Some(key) = self.key_source.get_key().await? {
            return Ok(key);
        }
        provided
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .ok_or_else(|| SimulationError::Configuration(MISSING_KEY_MESSAGE.to_string()))
    }

    /// Runs the suitability gate alone. A rejection comes back as
    /// [`SimulationError::ValidationRejected`].
    pub async fn validate(&self, request: ValidateRequest) -> Result<(), SimulationError> {
        let photo = parse_image("patientImage", &request.patient_image)?;
        let api_key = self.resolve_key(request.api_key.as_deref()).await?;

        let started = Instant::now();
        let verdict = self.gate.validate(&photo, &api_key).await;
        metrics::record_stage("validation", started.elapsed());

        match verdict? {
            Verdict::Accepted => Ok(()),
            Verdict::Rejected(message) => Err(SimulationError::ValidationRejected(message)),
        }
    }

    /// Runs a full simulation and returns the final image as a PNG data URI.
    pub async fn simulate(&self, request: SimulateRequest) -> Result<DataUri, SimulationError> {
        let started = Instant::now();
        let mut run = SimulationRun::new();

        let result = self.run_pipeline(request, &mut run).await;
        if result.is_err() && run.state().is_busy() {
            let _ = run.advance(SimulationState::Failed);
        }

        match &result {
            Ok(_) => {
                info!("Simulation completed in {:?}", started.elapsed());
                metrics::record_simulation("success");
            }
            Err(e) => {
                match e {
                    SimulationError::Internal(_) | SimulationError::InvalidTransition { .. } => {
                        error!("Simulation failed in state {:?}: {}", run.state(), e)
                    }
                    _ => info!("Simulation stopped in state {:?}: {}", run.state(), e),
                }
                metrics::record_simulation(e.kind());
            }
        }
        result
    }

    async fn run_pipeline(
        &self,
        request: SimulateRequest,
        run: &mut SimulationRun,
    ) -> Result<DataUri, SimulationError> {
        let photo = parse_image("patientImage", &request.patient_image)?;
        run.advance(SimulationState::Uploaded)?;

        let mask = request
            .mask
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .ok_or_else(|| {
                SimulationError::InvalidRequest("A mask is required to run a simulation".to_string())
            })?;
        let mask = parse_image("mask", mask)?;
        let density = parse_density(request.density.as_deref())?;
        let api_key = self.resolve_key(request.api_key.as_deref()).await?;

        run.advance(SimulationState::Validating)?;
        let stage = Instant::now();
        let verdict = self.gate.validate(&photo, &api_key).await;
        metrics::record_stage("validation", stage.elapsed());
        if let Verdict::Rejected(message) = verdict? {
            run.advance(SimulationState::Failed)?;
            return Err(SimulationError::ValidationRejected(message));
        }
        run.advance(SimulationState::Ready)?;
        run.advance(SimulationState::Masked)?;
        run.advance(SimulationState::Generating)?;

        let stage = Instant::now();
        let (reference, ai_input) = tokio::join!(
            self.lookup_reference(density),
            self.compose_input(photo.clone(), mask.clone())
        );
        let ai_input = ai_input?;
        metrics::record_stage("prepare", stage.elapsed());

        let stage = Instant::now();
        let prompt = simulation_request(reference.as_ref(), &ai_input, density);
        debug!(
            "Requesting {} simulation from {} with {} parts",
            density,
            self.model.model(),
            prompt.parts.len()
        );
        let response = self.model.generate_content(&prompt, &api_key).await;
        metrics::record_stage("generation", stage.elapsed());
        let ai_output = response?
            .first_image()
            .cloned()
            .ok_or_else(|| SimulationError::Generation(NO_IMAGE_MESSAGE.to_string()))?;

        let stage = Instant::now();
        let result = self.composite(photo, ai_output, mask).await?;
        metrics::record_stage("composite", stage.elapsed());

        run.advance(SimulationState::Complete)?;
        Ok(result)
    }

    async fn lookup_reference(&self, density: Density) -> Option<DataUri> {
        match &self.references {
            Some(catalog) => catalog.select(density).await.map(|e| e.to_data_uri()),
            None => {
                debug!("No reference catalog configured");
                None
            }
        }
    }

    async fn compose_input(&self, photo: DataUri, mask: DataUri) -> Result<DataUri, SimulationError> {
        let backend = self.backend;
        let composed = tokio::task::spawn_blocking(move || match backend {
            BackendKind::Buffer => prepare_ai_input::<BufferBackend>(&photo, &mask),
            BackendKind::Canvas => prepare_ai_input::<CanvasBackend>(&photo, &mask),
        })
        .await
        .map_err(|e| SimulationError::Internal(format!("Composition task failed: {}", e)))?;

        composed.map_err(|e| {
            warn!("Failed to compose AI input: {}", e);
            SimulationError::Generation(e.to_string())
        })
    }

    async fn composite(
        &self,
        photo: DataUri,
        ai_output: DataUri,
        mask: DataUri,
    ) -> Result<DataUri, SimulationError> {
        let backend = self.backend;
        tokio::task::spawn_blocking(move || match backend {
            BackendKind::Buffer => composite_or_fallback::<BufferBackend>(&photo, &ai_output, &mask),
            BackendKind::Canvas => composite_or_fallback::<CanvasBackend>(&photo, &ai_output, &mask),
        })
        .await
        .map_err(|e| SimulationError::Internal(format!("Composition task failed: {}", e)))
    }
}
