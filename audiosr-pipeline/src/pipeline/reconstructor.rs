//! Per-channel chunk reconstruction
//!
//! For every chunk of a plan, in order:
//!
//! 1. Stop if cancellation was requested
//! 2. Measure loudness of the padded chunk at the input rate
//! 3. Dispatch the padded chunk to the oracle (under the oracle lock)
//! 4. Collapse the single output row and trim it to the chunk's real
//!    content (`keep` samples), discarding what the padding produced
//! 5. Rescale the trimmed output to the padded chunk's loudness
//! 6. Apply crossfade weights when overlap is enabled
//! 7. Add into the accumulator at the chunk's output placement
//!
//! An oracle failure aborts the channel immediately; no chunk is ever
//! skipped.

use crate::dsp::loudness::{rescale_to_match, Loudness, LoudnessMeter};
use crate::error::{Error, Result};
use crate::oracle::{GenerationParams, OracleError, OracleRequest, UpsamplingOracle};
use crate::pipeline::crossfade::{ChunkPosition, CrossfadeWindow};
use crate::pipeline::planner::{extract_padded, ChunkDescriptor, ChunkPlan, OutputGeometry};
use audiosr_common::FadeCurve;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tracing::{debug, info, warn};

/// Overlap-add accumulator for one channel.
///
/// Chunks are always added, never assigned. The buffer remembers the
/// furthest sample written so unused capacity is not emitted.
#[derive(Debug, Clone)]
pub struct ReconstructionBuffer {
    samples: Vec<f32>,
    written: usize,
}

impl ReconstructionBuffer {
    /// Zero-filled buffer of `capacity` samples
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: vec![0.0; capacity],
            written: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.samples.len()
    }

    /// One past the furthest sample written so far
    pub fn written_len(&self) -> usize {
        self.written
    }

    /// Sum `chunk` into the buffer starting at `offset`.
    pub fn add_at(&mut self, offset: usize, chunk: &[f32]) -> Result<()> {
        let end = offset + chunk.len();
        if end > self.samples.len() {
            return Err(Error::Internal(format!(
                "Chunk [{}, {}) exceeds reconstruction buffer of {} samples",
                offset,
                end,
                self.samples.len()
            )));
        }

        for (dst, src) in self.samples[offset..end].iter_mut().zip(chunk) {
            *dst += src;
        }
        self.written = self.written.max(end);
        Ok(())
    }

    /// The accumulated samples
    pub fn as_slice(&self) -> &[f32] {
        &self.samples[..self.written]
    }

    /// Finish the channel, truncated to the written extent
    pub fn into_samples(mut self) -> Vec<f32> {
        self.samples.truncate(self.written);
        self.samples
    }
}

/// What happened to one chunk
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChunkReport {
    pub index: usize,

    /// Loudness of the padded input chunk
    pub loudness_before: Loudness,

    /// Loudness of the trimmed oracle output, before rescaling
    pub loudness_after: Loudness,

    /// Output samples kept
    pub keep: usize,

    /// Gain applied in dB; `None` when loudness matching was skipped
    pub gain_db: Option<f64>,
}

impl ChunkReport {
    pub fn rescaled(&self) -> bool {
        self.gain_db.is_some()
    }
}

/// A reconstructed channel plus per-chunk reports
#[derive(Debug, Clone)]
pub struct ChannelOutput {
    pub samples: Vec<f32>,
    pub reports: Vec<ChunkReport>,
}

/// Everything shared by the channels of one run
pub struct ReconstructionContext<'a> {
    pub plan: &'a ChunkPlan,
    pub geometry: OutputGeometry,
    pub params: GenerationParams,
    pub fade_curve: FadeCurve,
    pub meter: &'a dyn LoudnessMeter,
    pub cancel: &'a AtomicBool,
    pub scratch: &'a Path,
}

/// Human-readable channel label for progress logs
pub fn channel_label(channel: usize, channel_count: usize) -> String {
    match (channel, channel_count) {
        (0, 1) => "Mono".to_string(),
        (0, 2) => "Left".to_string(),
        (1, 2) => "Right".to_string(),
        (c, _) => format!("#{}", c),
    }
}

/// Reconstruct one channel at the oracle's output rate.
///
/// `channel_count` is only used for log labels.
pub fn reconstruct_channel<O>(
    ctx: &ReconstructionContext<'_>,
    channel: usize,
    channel_count: usize,
    samples: &[f32],
    oracle: &Mutex<O>,
) -> Result<ChannelOutput>
where
    O: UpsamplingOracle + ?Sized,
{
    if samples.len() != ctx.plan.channel_length {
        return Err(Error::ShapeMismatch(format!(
            "channel {} has {} samples, plan was built for {}",
            channel,
            samples.len(),
            ctx.plan.channel_length
        )));
    }

    let label = channel_label(channel, channel_count);
    let total = ctx.plan.len();
    let mut buffer = ReconstructionBuffer::with_capacity(ctx.geometry.buffer_capacity(ctx.plan));
    let mut reports = Vec::with_capacity(total);

    for chunk in ctx.plan {
        if ctx.cancel.load(Ordering::SeqCst) {
            warn!("Cancellation requested, stopping before chunk {} of {} channel", chunk.index, label);
            return Err(Error::Cancelled {
                channel,
                chunk: chunk.index,
            });
        }

        info!("Processing chunk {} of {} for {} channel", chunk.index + 1, total, label);

        let padded = extract_padded(samples, chunk);
        let loudness_before = ctx.meter.integrated_loudness(&padded, ctx.geometry.input_rate);

        let output = dispatch(ctx, channel, chunk, &padded, oracle)?;
        let keep = ctx.geometry.keep_for(chunk);
        let mut trimmed = collapse_and_trim(output, keep).map_err(|source| Error::Oracle {
            channel,
            chunk: chunk.index,
            source,
        })?;

        let loudness_after = ctx.meter.integrated_loudness(&trimmed, ctx.geometry.output_rate);
        let gain_db = rescale_to_match(loudness_before, loudness_after, &mut trimmed);
        match gain_db {
            Some(db) => debug!(
                "Chunk {}: {} -> {} ({:+.2} dB)",
                chunk.index, loudness_after, loudness_before, db
            ),
            None => warn!(
                "Chunk {} of {} channel: loudness undefined (input {}, output {}), skipping loudness match",
                chunk.index, label, loudness_before, loudness_after
            ),
        }

        if ctx.geometry.overlap_enabled {
            let seams = ctx.geometry.seams(ctx.plan, chunk.index);
            let window = CrossfadeWindow::for_seams(ctx.fade_curve, seams, keep);
            window.apply(&mut trimmed, ChunkPosition::of(chunk.index, total));
        }

        buffer.add_at(ctx.geometry.placement(chunk), &trimmed)?;

        reports.push(ChunkReport {
            index: chunk.index,
            loudness_before,
            loudness_after,
            keep,
            gain_db,
        });
    }

    debug!(
        "{} channel reconstructed: {} samples (capacity {})",
        label,
        buffer.written_len(),
        buffer.capacity()
    );

    Ok(ChannelOutput {
        samples: buffer.into_samples(),
        reports,
    })
}

fn dispatch<O>(
    ctx: &ReconstructionContext<'_>,
    channel: usize,
    chunk: &ChunkDescriptor,
    padded: &[f32],
    oracle: &Mutex<O>,
) -> Result<Vec<Vec<f32>>>
where
    O: UpsamplingOracle + ?Sized,
{
    let request = OracleRequest {
        chunk: padded,
        input_rate: ctx.geometry.input_rate,
        params: ctx.params,
        channel,
        chunk_index: chunk.index,
        scratch: ctx.scratch,
    };

    let mut guard = oracle
        .lock()
        .map_err(|_| Error::Internal("Oracle lock poisoned".to_string()))?;

    guard.upsample(&request).map_err(|source| Error::Oracle {
        channel,
        chunk: chunk.index,
        source,
    })
}

/// Reduce oracle output to one row of exactly `keep` finite samples.
fn collapse_and_trim(mut output: Vec<Vec<f32>>, keep: usize) -> std::result::Result<Vec<f32>, OracleError> {
    if output.len() != 1 {
        return Err(OracleError::Malformed(format!(
            "expected 1 output row, got {}",
            output.len()
        )));
    }

    let mut row = output.remove(0);
    if row.is_empty() {
        return Err(OracleError::Malformed("empty output".to_string()));
    }
    if row.len() < keep {
        return Err(OracleError::Malformed(format!(
            "output has {} samples, at least {} required",
            row.len(),
            keep
        )));
    }

    row.truncate(keep);
    if let Some(pos) = row.iter().position(|s| !s.is_finite()) {
        return Err(OracleError::Malformed(format!("non-finite sample at {}", pos)));
    }
    Ok(row)
}
