use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::path::PathBuf;
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use hairline_server::config::{AppConfig, CliConfig, FileConfig};
use hairline_server::generative::{ApiKeySource, GeminiProvider, ImageModel, API_KEY_ENV_VAR};
use hairline_server::imaging::BackendKind;
use hairline_server::reference::ReferenceCatalog;
use hairline_server::server::{self, ServerConfig};
use hairline_server::{run_server, RequestsLoggingLevel, Simulator};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to a TOML config file. Values found there override the flags below.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3001)]
    pub port: u16,

    /// The port for the metrics server (Prometheus scraping).
    #[clap(long, default_value_t = 9091)]
    pub metrics_port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Directory holding density/<low|medium|high>/ reference photos.
    #[clap(long, value_parser = parse_path)]
    pub references_dir: Option<PathBuf>,

    /// Path to the frontend directory to be statically served.
    #[clap(long)]
    pub frontend_dir_path: Option<String>,

    /// Generative model used for validation and simulation.
    #[clap(long, default_value = hairline_server::generative::DEFAULT_MODEL)]
    pub model: String,

    /// Base URL of the generative model API.
    #[clap(long, default_value = hairline_server::generative::DEFAULT_API_BASE)]
    pub api_base: String,

    /// Timeout in seconds for each model request.
    #[clap(long, default_value_t = 120)]
    pub request_timeout_sec: u64,

    /// Maximum accepted request body, in megabytes.
    #[clap(long, default_value_t = 50)]
    pub body_limit_mb: usize,

    /// Raster implementation used for compositing.
    #[clap(long, value_enum, default_value_t = BackendKind::Buffer)]
    pub raster_backend: BackendKind,
}

impl From<&CliArgs> for CliConfig {
    fn from(args: &CliArgs) -> Self {
        CliConfig {
            port: args.port,
            metrics_port: args.metrics_port,
            logging_level: args.logging_level.clone(),
            references_dir: args.references_dir.clone(),
            frontend_dir_path: args.frontend_dir_path.clone(),
            model: args.model.clone(),
            api_base: args.api_base.clone(),
            request_timeout_sec: args.request_timeout_sec,
            body_limit_mb: args.body_limit_mb,
            raster_backend: args.raster_backend,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config from {:?}...", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    let config = AppConfig::resolve(&CliConfig::from(&cli_args), file_config)?;

    info!("Initializing metrics...");
    server::metrics::init_metrics();

    let model: Arc<dyn ImageModel> = Arc::new(
        GeminiProvider::new(config.model.api_base.clone(), config.model.name.clone())
            .with_timeout(config.model.request_timeout),
    );
    info!(
        "Using model {} via {} ({} raster backend)",
        model.model(),
        model.name(),
        config.raster_backend.name()
    );

    let key_source = ApiKeySource::from_config(
        config.model.api_key.clone(),
        config.model.api_key_command.clone(),
    );
    if !key_source.is_configured() {
        warn!(
            "No server API key configured (set {} or [model] api_key); clients must send their own",
            API_KEY_ENV_VAR
        );
    }

    let references = match &config.references_dir {
        Some(dir) => {
            info!("Serving density references from {:?}", dir);
            Some(ReferenceCatalog::new(dir))
        }
        None => {
            warn!("No references directory configured, simulations run without exemplars");
            None
        }
    };

    let simulator =
        Simulator::new(model, references, key_source).with_backend(config.raster_backend);

    tokio::select! {
        result = run_server(ServerConfig::from(&config), Arc::new(simulator)) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down...");
            Ok(())
        }
    }
}
