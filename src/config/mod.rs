mod file_config;

pub use file_config::{FileConfig, ModelConfig};

use crate::generative::{DEFAULT_API_BASE, DEFAULT_MODEL};
use crate::imaging::BackendKind;
use crate::server::RequestsLoggingLevel;
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;
use std::time::Duration;

/// Settings for the generative model client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSettings {
    pub name: String,
    pub api_base: String,
    pub api_key: Option<String>,
    pub api_key_command: Option<String>,
    pub request_timeout: Duration,
}

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub references_dir: Option<PathBuf>,
    pub frontend_dir_path: Option<String>,
    pub model: String,
    pub api_base: String,
    pub request_timeout_sec: u64,
    pub body_limit_mb: usize,
    pub raster_backend: BackendKind,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            port: 3001,
            metrics_port: 9091,
            logging_level: RequestsLoggingLevel::default(),
            references_dir: None,
            frontend_dir_path: None,
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            request_timeout_sec: 120,
            body_limit_mb: 50,
            raster_backend: BackendKind::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub references_dir: Option<PathBuf>,
    pub frontend_dir_path: Option<String>,
    pub body_limit_bytes: usize,
    pub raster_backend: BackendKind,
    pub model: ModelSettings,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let port = file.port.unwrap_or(cli.port);
        let metrics_port = file.metrics_port.unwrap_or(cli.metrics_port);
        if port == metrics_port {
            bail!("port and metrics_port must differ (both are {})", port);
        }

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let references_dir = file
            .references_dir
            .map(PathBuf::from)
            .or_else(|| cli.references_dir.clone());
        if let Some(dir) = &references_dir {
            if !dir.is_dir() {
                bail!("references_dir is not a directory: {:?}", dir);
            }
        }

        let frontend_dir_path = file
            .frontend_dir_path
            .or_else(|| cli.frontend_dir_path.clone());

        let body_limit_mb = file.body_limit_mb.unwrap_or(cli.body_limit_mb);
        if body_limit_mb == 0 {
            bail!("body_limit_mb must be greater than zero");
        }

        let raster_backend = match file.raster_backend {
            Some(s) => match BackendKind::from_str(&s, true) {
                Ok(kind) => kind,
                Err(_) => bail!("Unknown raster_backend: {}", s),
            },
            None => cli.raster_backend,
        };

        let model_file = file.model.unwrap_or_default();
        let model = ModelSettings {
            name: model_file.name.unwrap_or_else(|| cli.model.clone()),
            api_base: model_file.api_base.unwrap_or_else(|| cli.api_base.clone()),
            api_key: model_file.api_key,
            api_key_command: model_file.api_key_command,
            request_timeout: Duration::from_secs(
                model_file
                    .request_timeout_sec
                    .unwrap_or(cli.request_timeout_sec),
            ),
        };

        Ok(AppConfig {
            port,
            metrics_port,
            logging_level,
            references_dir,
            frontend_dir_path,
            body_limit_bytes: body_limit_mb * 1024 * 1024,
            raster_backend,
            model,
        })
    }
}

fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
