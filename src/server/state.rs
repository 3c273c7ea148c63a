use axum::extract::FromRef;

use crate::simulation::Simulator;
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;

pub type GuardedSimulator = Arc<Simulator>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub simulator: GuardedSimulator,
    pub hash: String,
}

impl ServerState {
    pub fn new(config: ServerConfig, simulator: GuardedSimulator) -> Self {
        ServerState {
            config,
            start_time: Instant::now(),
            simulator,
            hash: env!("GIT_HASH").to_owned(),
        }
    }
}

impl FromRef<ServerState> for GuardedSimulator {
    fn from_ref(input: &ServerState) -> Self {
        input.simulator.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
