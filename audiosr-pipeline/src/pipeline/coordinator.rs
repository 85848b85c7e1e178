//! Multichannel coordination
//!
//! Plans once for the shared channel length, reconstructs every channel
//! (sequentially, or on scoped threads with the oracle behind its mutex) and
//! checks that all channels came back with the same length.

use crate::audio::types::MultiChannelAudio;
use crate::dsp::loudness::LoudnessMeter;
use crate::error::{Error, Result};
use crate::oracle::{GenerationParams, UpsamplingOracle};
use crate::pipeline::planner::{chunk_samples_for, plan_chunks, ChunkPlan};
use crate::pipeline::reconstructor::{reconstruct_channel, ChannelOutput, ChunkReport, ReconstructionContext};
use audiosr_common::FadeCurve;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tracing::{debug, info};

/// Chunking and scheduling options
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChunkingOptions {
    /// Nominal chunk duration in seconds
    pub chunk_seconds: f64,

    /// Overlap as a fraction of the chunk, in `[0, 1)`
    pub overlap: f64,

    pub fade_curve: FadeCurve,

    /// Reconstruct channels on separate threads
    pub parallel_channels: bool,
}

impl Default for ChunkingOptions {
    fn default() -> Self {
        Self {
            chunk_seconds: 10.24,
            overlap: 0.04,
            fade_curve: FadeCurve::Linear,
            parallel_channels: false,
        }
    }
}

/// Run-scoped collaborators handed to the coordinator
pub struct RunResources<'a> {
    pub meter: &'a dyn LoudnessMeter,
    pub cancel: &'a AtomicBool,
    pub scratch: &'a Path,
}

/// Reconstructed audio plus the plan and per-chunk reports
#[derive(Debug, Clone)]
pub struct Reconstruction {
    pub audio: MultiChannelAudio,
    pub plan: ChunkPlan,

    /// One report list per channel
    pub reports: Vec<Vec<ChunkReport>>,
}

/// Reconstruct every channel of `audio` at the oracle's output rate.
pub fn reconstruct_audio<O>(
    audio: &MultiChannelAudio,
    options: &ChunkingOptions,
    params: GenerationParams,
    resources: &RunResources<'_>,
    oracle: &Mutex<O>,
) -> Result<Reconstruction>
where
    O: UpsamplingOracle + ?Sized,
{
    let channel_count = audio.channel_count();
    if channel_count == 0 {
        return Err(Error::Planning("Input has no channels".to_string()));
    }

    let chunk_samples = chunk_samples_for(options.chunk_seconds, audio.sample_rate)?;
    let plan = plan_chunks(audio.frames(), chunk_samples, options.overlap)?;

    let output_rate = oracle
        .lock()
        .map_err(|_| Error::Internal("Oracle lock poisoned".to_string()))?
        .output_rate();
    let geometry = plan.output_geometry(audio.sample_rate, output_rate)?;

    info!(
        "Reconstructing {} channel(s), {} chunk(s) each, {}Hz -> {}Hz",
        channel_count,
        plan.len(),
        audio.sample_rate,
        output_rate
    );
    debug!(?geometry, "Output geometry");

    let ctx = ReconstructionContext {
        plan: &plan,
        geometry,
        params,
        fade_curve: options.fade_curve,
        meter: resources.meter,
        cancel: resources.cancel,
        scratch: resources.scratch,
    };

    let outputs = if options.parallel_channels && channel_count > 1 {
        run_parallel(&ctx, audio, oracle)?
    } else {
        audio
            .channels
            .iter()
            .enumerate()
            .map(|(ch, samples)| reconstruct_channel(&ctx, ch, channel_count, samples, oracle))
            .collect::<Result<Vec<_>>>()?
    };

    check_lengths(&outputs)?;

    let (channels, reports): (Vec<_>, Vec<_>) = outputs
        .into_iter()
        .map(|out| (out.samples, out.reports))
        .unzip();

    Ok(Reconstruction {
        audio: MultiChannelAudio::new(channels, output_rate)?,
        plan,
        reports,
    })
}

fn run_parallel<O>(
    ctx: &ReconstructionContext<'_>,
    audio: &MultiChannelAudio,
    oracle: &Mutex<O>,
) -> Result<Vec<ChannelOutput>>
where
    O: UpsamplingOracle + ?Sized,
{
    let channel_count = audio.channel_count();
    debug!("Reconstructing {} channels in parallel", channel_count);

    let results: Vec<Result<ChannelOutput>> = std::thread::scope(|scope| {
        let handles: Vec<_> = audio
            .channels
            .iter()
            .enumerate()
            .map(|(ch, samples)| {
                scope.spawn(move || {
                    let result = reconstruct_channel(ctx, ch, channel_count, samples, oracle);
                    if result.is_err() {
                        // Siblings stop at their next chunk boundary
                        ctx.cancel.store(true, Ordering::SeqCst);
                    }
                    result
                })
            })
            .collect();

        handles
            .into_iter()
            .enumerate()
            .map(|(ch, handle)| {
                handle
                    .join()
                    .unwrap_or_else(|_| Err(Error::Internal(format!("Channel {} worker panicked", ch))))
            })
            .collect()
    });

    // Report the root failure rather than a cancellation it caused elsewhere
    let mut outputs = Vec::with_capacity(results.len());
    let mut first_error = None;
    for result in results {
        match result {
            Ok(out) => outputs.push(out),
            Err(e) => {
                let replace = match &first_error {
                    None => true,
                    Some(Error::Cancelled { .. }) => !matches!(e, Error::Cancelled { .. }),
                    Some(_) => false,
                };
                if replace {
                    first_error = Some(e);
                }
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(outputs),
    }
}

fn check_lengths(outputs: &[ChannelOutput]) -> Result<()> {
    let Some(first) = outputs.first() else {
        return Ok(());
    };
    let expected = first.samples.len();
    for (ch, out) in outputs.iter().enumerate().skip(1) {
        if out.samples.len() != expected {
            return Err(Error::ShapeMismatch(format!(
                "reconstructed channel {} has {} samples, channel 0 has {}",
                ch,
                out.samples.len(),
                expected
            )));
        }
    }
    Ok(())
}
