//! File-to-file processing
//!
//! decode → resample to `2 × input_cutoff` → reconstruct → optional ensemble
//! (reference = input resampled to the output rate) → 16-bit PCM WAV named
//! `SR_<stem>.wav`.

use crate::audio::writer::write_pcm16;
use crate::audio::{decode_file, MultiChannelAudio, Resampler};
use crate::config::AudioSrConfig;
use crate::error::{Error, Result};
use crate::pipeline::{blend, Reconstruction};
use crate::session::RunSession;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{info, warn};

/// Summary of a completed run
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub output_path: PathBuf,
    pub seed: u64,
    pub channels: usize,
    pub frames: usize,
    pub sample_rate: u32,
    pub chunks_per_channel: usize,
    /// Chunks whose loudness match was skipped
    pub unmatched_chunks: usize,
}

/// Deterministic output location: `<dir>/SR_<input stem>.wav`.
///
/// `output_dir` defaults to the input's directory.
pub fn output_path_for(input: &Path, output_dir: Option<&Path>) -> Result<PathBuf> {
    let stem = input
        .file_stem()
        .ok_or_else(|| Error::Config(format!("Input path {} has no file name", input.display())))?
        .to_string_lossy();

    let dir = match output_dir {
        Some(dir) => dir.to_path_buf(),
        None => input
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default(),
    };

    Ok(dir.join(format!("SR_{}.wav", stem)))
}

/// Process one input file according to `config`.
///
/// `cancel` is observed between chunks; pass the flag a signal handler sets.
pub fn run_file(
    config: &AudioSrConfig,
    input: &Path,
    output_dir: Option<&Path>,
    cancel: Arc<AtomicBool>,
) -> Result<RunOutcome> {
    config.validate()?;
    let output_path = output_path_for(input, output_dir)?;

    let decoded = decode_file(input)?;
    info!(
        "Input: {} channel(s), {} frames at {}Hz ({:.2}s)",
        decoded.channel_count(),
        decoded.frames(),
        decoded.sample_rate,
        decoded.duration_seconds()
    );

    let planning_rate = config.planning_rate();
    info!("Input cutoff {}Hz, resampling to {}Hz", config.ensemble.input_cutoff, planning_rate);
    let audio = Resampler::resample_audio(&decoded, planning_rate)?;

    let seed = config.resolve_seed();
    let params = config.generation_params(seed);

    let session = RunSession::new(config.build_oracle()?, config.chunking_options())?
        .with_cancel_flag(cancel);
    let result = session.reconstruct(&audio, params);

    // Scratch goes away on every path; a failed removal only matters when
    // the run itself succeeded
    let closed = session.close();
    let reconstruction = result?;
    if let Err(e) = closed {
        warn!("Could not remove scratch directory: {}", e);
    }

    let output = finish(config, &decoded, &reconstruction)?;

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    write_pcm16(&output_path, &output)?;
    info!("Wrote {}", output_path.display());

    Ok(RunOutcome {
        output_path,
        seed,
        channels: output.channel_count(),
        frames: output.frames(),
        sample_rate: output.sample_rate,
        chunks_per_channel: reconstruction.plan.len(),
        unmatched_chunks: reconstruction
            .reports
            .iter()
            .flatten()
            .filter(|r| !r.rescaled())
            .count(),
    })
}

/// Apply the ensemble if enabled, otherwise pass the reconstruction through.
fn finish(
    config: &AudioSrConfig,
    decoded: &MultiChannelAudio,
    reconstruction: &Reconstruction,
) -> Result<MultiChannelAudio> {
    let Some(settings) = config.ensemble_settings() else {
        return Ok(reconstruction.audio.clone());
    };

    info!(
        "Applying multiband ensemble (crossover {}Hz, guard {}Hz)",
        settings.crossover_frequency, settings.guard_frequency
    );
    let reference = Resampler::resample_audio(decoded, reconstruction.audio.sample_rate)?;
    blend(&reconstruction.audio, &reference, &settings)
}
