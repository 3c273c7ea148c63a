use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub port: Option<u16>,
    pub metrics_port: Option<u16>,
    pub logging_level: Option<String>,
    pub references_dir: Option<String>,
    pub frontend_dir_path: Option<String>,
    pub body_limit_mb: Option<usize>,
    /// "buffer" or "canvas"
    pub raster_backend: Option<String>,

    // Feature configs
    pub model: Option<ModelConfig>,
}

/// `[model]` table.
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct ModelConfig {
    pub name: Option<String>,
    pub api_base: Option<String>,
    /// Static API key; takes precedence over `api_key_command`.
    pub api_key: Option<String>,
    /// Shell command printing the API key, run before each request.
    pub api_key_command: Option<String>,
    pub request_timeout_sec: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
