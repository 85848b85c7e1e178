//! audiosr - chunked audio super-resolution
//!
//! Upsamples an audio file by sending overlapping chunks through an
//! upsampling oracle and writes `SR_<stem>.wav` (16-bit PCM) next to the
//! input or into `--output`.
//!
//! Ctrl+C stops the run before the next chunk is dispatched; the scratch
//! directory is removed either way.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use audiosr_pipeline::config::{AudioSrConfig, ConfigOverrides};
use audiosr_pipeline::runner::run_file;
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter};

/// Command-line arguments for audiosr
///
/// Unset options fall back to the config file, then to built-in defaults.
#[derive(Parser, Debug)]
#[command(name = "audiosr")]
#[command(about = "Chunked audio super-resolution")]
#[command(version)]
struct Args {
    /// Audio file to upsample
    #[arg(short, long)]
    input: PathBuf,

    /// Output directory (default: the input's directory)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Chunk duration in seconds [default: 10.24]
    #[arg(long)]
    chunk_size: Option<f64>,

    /// Overlap between chunks as a fraction of the chunk [default: 0.04]
    #[arg(long)]
    overlap: Option<f64>,

    /// Guidance scale [default: 3.5]
    #[arg(long)]
    guidance_scale: Option<f32>,

    /// Number of sampling steps [default: 50]
    #[arg(long)]
    ddim_steps: Option<u32>,

    /// Random seed, 0 for a random one [default: 0]
    #[arg(long)]
    seed: Option<u64>,

    /// Blend the original low band with the upsampled high band
    #[arg(long)]
    multiband_ensemble: bool,

    /// Highest trusted input frequency in Hz [default: 12000]
    #[arg(long)]
    input_cutoff: Option<u32>,

    /// Configuration file (TOML)
    #[arg(short, long, env = "AUDIOSR_CONFIG")]
    config: Option<PathBuf>,

    /// External oracle program (switches to the command oracle)
    #[arg(long)]
    oracle_command: Option<PathBuf>,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            chunk_seconds: self.chunk_size,
            overlap: self.overlap,
            guidance_scale: self.guidance_scale,
            steps: self.ddim_steps,
            seed: self.seed,
            ensemble: self.multiband_ensemble.then_some(true),
            input_cutoff: self.input_cutoff,
            oracle_command: self.oracle_command.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Default filter until the configured level is known; RUST_LOG wins over both
    let rust_log = EnvFilter::try_from_default_env().ok();
    let has_rust_log = rust_log.is_some();
    let (filter, filter_handle) =
        reload::Layer::new(rust_log.unwrap_or_else(|| EnvFilter::new(crate_filter("info"))));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = AudioSrConfig::load(args.config.as_deref())
        .context("Failed to load configuration")?;
    config.apply_overrides(&args.overrides());

    if !has_rust_log {
        filter_handle
            .reload(EnvFilter::new(crate_filter(&config.logging.level)))
            .context("Failed to apply configured log level")?;
    }

    info!(
        "Starting audiosr v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    config.validate().context("Invalid configuration")?;
    info!(
        "Chunk {}s, overlap {}, guidance {}, steps {}, ensemble {}",
        config.pipeline.chunk_seconds,
        config.pipeline.overlap,
        config.generation.guidance_scale,
        config.generation.steps,
        if config.ensemble.enabled { "on" } else { "off" }
    );

    let cancel = Arc::new(AtomicBool::new(false));
    tokio::spawn(cancel_on_ctrl_c(Arc::clone(&cancel)));

    let input = args.input.clone();
    let output = args.output.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        run_file(&config, &input, output.as_deref(), cancel)
    })
    .await
    .context("Processing task failed")?
    .with_context(|| format!("Failed to process {}", args.input.display()))?;

    if outcome.unmatched_chunks > 0 {
        warn!(
            "{} chunk(s) were not loudness matched (too short or silent)",
            outcome.unmatched_chunks
        );
    }
    info!(
        "Done: {} ({} channel(s), {} frames at {}Hz, seed {})",
        outcome.output_path.display(),
        outcome.channels,
        outcome.frames,
        outcome.sample_rate,
        outcome.seed
    );
    Ok(())
}

/// Filter directives enabling `level` for the workspace crates
fn crate_filter(level: &str) -> String {
    format!("audiosr={level},audiosr_pipeline={level},audiosr_common={level}")
}

/// Set the cancellation flag on Ctrl+C
async fn cancel_on_ctrl_c(cancel: Arc<AtomicBool>) {
    match signal::ctrl_c().await {
        Ok(()) => {
            warn!("Received Ctrl+C, stopping after the current chunk");
            cancel.store(true, Ordering::SeqCst);
        }
        Err(e) => warn!("Failed to install Ctrl+C handler: {}", e),
    }
}
