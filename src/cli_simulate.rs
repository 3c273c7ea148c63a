//! Runs one simulation from the command line, without the HTTP server.
//!
//! ```text
//! cli-simulate photo.jpg mask.png -o result.png --density high
//! ```

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use hairline_server::generative::{
    ApiKeySource, GeminiProvider, DEFAULT_API_BASE, DEFAULT_MODEL, DEFAULT_REQUEST_TIMEOUT,
};
use hairline_server::imaging::{normalize_upload, BackendKind, DataUri};
use hairline_server::reference::{Density, ReferenceCatalog};
use hairline_server::simulation::{SimulateRequest, Simulator};

#[derive(Parser, Debug)]
#[command(about = "Simulate a hair transplant on a single photo")]
struct CliArgs {
    /// Patient photo (JPEG or PNG).
    photo: PathBuf,

    /// Mask image; its alpha channel marks the area to fill.
    mask: PathBuf,

    /// Where to write the resulting image.
    #[clap(short, long, default_value = "simulation.png")]
    output: PathBuf,

    /// Target density: low, medium or high.
    #[clap(short, long, default_value = "medium")]
    density: Density,

    /// API key, used when no server key is configured in the environment.
    #[clap(long)]
    api_key: Option<String>,

    /// Directory holding density/<low|medium|high>/ reference photos.
    #[clap(long)]
    references_dir: Option<PathBuf>,

    #[clap(long, default_value = DEFAULT_MODEL)]
    model: String,

    #[clap(long, default_value = DEFAULT_API_BASE)]
    api_base: String,

    #[clap(long, value_enum, default_value_t = BackendKind::Buffer)]
    raster_backend: BackendKind,
}

fn read_mask(path: &PathBuf) -> Result<DataUri> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read mask {:?}", path))?;
    let mime_type = infer::get(&bytes)
        .map(|kind| kind.mime_type())
        .unwrap_or("image/png");
    Ok(DataUri::from_bytes(mime_type, &bytes))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();

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

    let photo_bytes = std::fs::read(&args.photo)
        .with_context(|| format!("Failed to read photo {:?}", args.photo))?;
    let photo = normalize_upload(&photo_bytes).context("Photo is not a decodable image")?;
    let mask = read_mask(&args.mask)?;

    let references = match args.references_dir {
        Some(dir) if !dir.is_dir() => bail!("references_dir is not a directory: {:?}", dir),
        Some(dir) => Some(ReferenceCatalog::new(dir)),
        None => None,
    };

    let model = GeminiProvider::new(args.api_base, args.model).with_timeout(DEFAULT_REQUEST_TIMEOUT);
    let simulator = Simulator::new(
        Arc::new(model),
        references,
        ApiKeySource::from_config(None, None),
    )
    .with_backend(args.raster_backend);

    info!("Simulating {} density on {:?}...", args.density, args.photo);
    let result = simulator
        .simulate(SimulateRequest {
            patient_image: photo.to_string(),
            mask: Some(mask.to_string()),
            density: Some(args.density.key().to_string()),
            api_key: args.api_key,
        })
        .await?;

    let bytes = result.decode().context("Model returned an undecodable image")?;
    std::fs::write(&args.output, bytes)
        .with_context(|| format!("Failed to write {:?}", args.output))?;
    info!("Wrote {} result to {:?}", result.mime_type(), args.output);

    Ok(())
}
