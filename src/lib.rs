//! Hairline Simulation Server Library
//!
//! This library exposes the internal modules for the binaries and for testing.

pub mod config;
pub mod generative;
pub mod imaging;
pub mod reference;
pub mod server;
pub mod simulation;

// Re-export commonly used types for convenience
pub use server::{run_server, RequestsLoggingLevel};
pub use simulation::Simulator;
