//! Simulation state definitions.

use super::error::SimulationError;
use serde::{Deserialize, Serialize};

/// Where a simulation run stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationState {
    /// Nothing uploaded yet.
    Empty,
    Uploaded,
    /// Waiting on the suitability check.
    Validating,
    /// Photo accepted, no mask drawn.
    Ready,
    Masked,
    /// Waiting on the model.
    Generating,
    Complete,
    Failed,
}

impl SimulationState {
    /// Check if the run has produced a final outcome.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SimulationState::Complete | SimulationState::Failed)
    }

    /// Check if the run is waiting on the model.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            SimulationState::Validating | SimulationState::Generating
        )
    }

    pub fn can_transition_to(&self, to: SimulationState) -> bool {
        use SimulationState::*;
        matches!(
            (self, to),
            (Empty, Uploaded)
                | (Uploaded, Validating)
                | (Validating, Ready)
                | (Validating, Failed)
                | (Ready, Masked)
                | (Ready, Uploaded)
                | (Masked, Generating)
                | (Masked, Masked)
                | (Masked, Uploaded)
                | (Generating, Complete)
                | (Generating, Failed)
                | (Complete, Masked)
                | (Complete, Uploaded)
                | (Failed, Uploaded)
        )
    }
}

/// One pass through upload, validate, mask, generate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationRun {
    state: SimulationState,
    has_mask: bool,
}

impl Default for SimulationRun {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulationRun {
    pub fn new() -> Self {
        Self {
            state: SimulationState::Empty,
            has_mask: false,
        }
    }

    pub fn state(&self) -> SimulationState {
        self.state
    }

    pub fn has_mask(&self) -> bool {
        self.has_mask
    }

    /// Moves to `to` if the transition is legal.
    ///
    /// Entering `Masked` attaches a mask, entering `Uploaded` drops it, and
    /// `Generating` is refused while no mask is attached.
    pub fn advance(&mut self, to: SimulationState) -> Result<SimulationState, SimulationError> {
        let from = self.state;
        let mask_missing = to == SimulationState::Generating && !self.has_mask;
        if !from.can_transition_to(to) || mask_missing {
            return Err(SimulationError::InvalidTransition { from, to });
        }

        match to {
            SimulationState::Masked => self.has_mask = true,
            SimulationState::Uploaded => self.has_mask = false,
            _ => {}
        }
        self.state = to;
        Ok(to)
    }
}
