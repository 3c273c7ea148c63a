//! Simulation request lifecycle.
//!
//! A run moves upload → validate → mask → generate → composite, tracked by an
//! explicit [`SimulationState`] machine. [`Simulator`] drives the whole thing
//! against an injected [`crate::generative::ImageModel`].

mod error;
mod pipeline;
mod state;
#[cfg(test)]
pub(crate) mod testing;
mod validation;

pub use error::{SimulationError, GENERATION_FAILED_MESSAGE, MISSING_KEY_MESSAGE, NO_IMAGE_MESSAGE};
pub use pipeline::{SimulateRequest, Simulator, ValidateRequest};
pub use state::{SimulationRun, SimulationState};
pub use validation::{classify, ValidationGate, Verdict};
