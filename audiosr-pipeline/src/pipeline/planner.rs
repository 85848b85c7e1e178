//! Chunk planning
//!
//! Splits one channel into fixed-length windows. Windows start at 0 and
//! advance by the stride (`chunk − overlap` with overlap enabled, `chunk`
//! otherwise) until a window reaches the end of the channel. Every input
//! sample is covered at least once; only the final window can run past the
//! end, in which case it is zero-padded to the nominal length before
//! dispatch. A window lying entirely inside the previous window's overlap is
//! never planned.
//!
//! The plan depends only on the channel length, so one plan serves every
//! channel of a run.

use crate::error::{Error, Result};
use tracing::debug;

/// One window of a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkDescriptor {
    /// Position in the plan (0-based)
    pub index: usize,

    /// First input sample covered
    pub start_offset: usize,

    /// Length handed to the oracle (after padding)
    pub nominal_length: usize,

    /// Input samples actually present (`≤ nominal_length`)
    pub actual_length: usize,

    /// True when zero padding was appended
    pub is_padded: bool,
}

impl ChunkDescriptor {
    /// One past the last real input sample covered
    pub fn end_offset(&self) -> usize {
        self.start_offset + self.actual_length
    }

    /// Number of zero samples appended before dispatch
    pub fn padding(&self) -> usize {
        self.nominal_length - self.actual_length
    }
}

/// Ordered windows for one channel plus the geometry that produced them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkPlan {
    pub chunks: Vec<ChunkDescriptor>,

    /// Channel length the plan was built for
    pub channel_length: usize,

    /// Nominal window length
    pub chunk_samples: usize,

    /// Samples shared by consecutive windows
    pub overlap_samples: usize,

    /// Distance between consecutive window starts
    pub stride: usize,

    /// Whether crossfading applies
    pub overlap_enabled: bool,
}

impl ChunkPlan {
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ChunkDescriptor> {
        self.chunks.iter()
    }

    /// Project the plan onto the oracle's output rate.
    pub fn output_geometry(&self, input_rate: u32, output_rate: u32) -> Result<OutputGeometry> {
        if input_rate == 0 || output_rate == 0 {
            return Err(Error::Planning(format!(
                "Sample rates must be positive ({} -> {})",
                input_rate, output_rate
            )));
        }

        let ratio = output_rate as f64 / input_rate as f64;
        let chunk_length = (self.chunk_samples as f64 * ratio).round() as usize;
        let stride = (self.stride as f64 * ratio).round() as usize;
        let overlap = if self.overlap_enabled {
            chunk_length.saturating_sub(stride)
        } else {
            0
        };

        Ok(OutputGeometry {
            input_rate,
            output_rate,
            ratio,
            chunk_length,
            stride,
            overlap,
            overlap_enabled: self.overlap_enabled,
        })
    }
}

impl<'a> IntoIterator for &'a ChunkPlan {
    type Item = &'a ChunkDescriptor;
    type IntoIter = std::slice::Iter<'a, ChunkDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.chunks.iter()
    }
}

/// Chunk geometry at the output rate.
///
/// With overlap, each chunk is placed at `round(start × ratio)`, so rounding
/// never accumulates across a long channel. The crossfade at every seam is
/// sized to what the two neighbours actually share, which moves by at most a
/// sample around `overlap`. Without overlap, chunks abut at multiples of
/// `chunk_length`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutputGeometry {
    /// Planning (oracle input) rate
    pub input_rate: u32,

    /// Oracle output rate
    pub output_rate: u32,

    /// `output_rate / input_rate`
    pub ratio: f64,

    /// Nominal chunk length at the output rate
    pub chunk_length: usize,

    /// Nominal distance between consecutive chunk placements
    pub stride: usize,

    /// Nominal crossfade length (0 without overlap)
    pub overlap: usize,

    pub overlap_enabled: bool,
}

/// Output samples a chunk shares with its neighbours
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Seams {
    /// Shared with the previous chunk
    pub head: usize,

    /// Shared with the next chunk
    pub tail: usize,
}

impl OutputGeometry {
    /// Output samples kept for a chunk: its real content, padding discarded
    pub fn keep_for(&self, chunk: &ChunkDescriptor) -> usize {
        (chunk.actual_length as f64 * self.ratio).round() as usize
    }

    /// Output offset of a chunk
    pub fn placement(&self, chunk: &ChunkDescriptor) -> usize {
        if self.overlap_enabled {
            (chunk.start_offset as f64 * self.ratio).round() as usize
        } else {
            chunk.index * self.stride
        }
    }

    /// One past the last output sample of a chunk
    pub fn output_end(&self, chunk: &ChunkDescriptor) -> usize {
        self.placement(chunk) + self.keep_for(chunk)
    }

    /// Overlap of chunk `index` with its neighbours in `plan`.
    ///
    /// Both sides of a seam see the same length, so their ramps line up.
    pub fn seams(&self, plan: &ChunkPlan, index: usize) -> Seams {
        if !self.overlap_enabled {
            return Seams::default();
        }

        let shared = |earlier: &ChunkDescriptor, later: &ChunkDescriptor| {
            self.output_end(earlier).saturating_sub(self.placement(later))
        };

        let current = match plan.chunks.get(index) {
            Some(chunk) => chunk,
            None => return Seams::default(),
        };
        let head = index
            .checked_sub(1)
            .and_then(|prev| plan.chunks.get(prev))
            .map_or(0, |prev| shared(prev, current));
        let tail = plan.chunks.get(index + 1).map_or(0, |next| shared(current, next));

        Seams { head, tail }
    }

    /// Accumulator size for a plan: the furthest output sample any chunk
    /// reaches.
    pub fn buffer_capacity(&self, plan: &ChunkPlan) -> usize {
        plan.iter().map(|c| self.output_end(c)).max().unwrap_or(0)
    }
}

/// Convert a chunk duration to samples: `floor(seconds × rate)`.
pub fn chunk_samples_for(seconds: f64, sample_rate: u32) -> Result<usize> {
    if !seconds.is_finite() || seconds <= 0.0 {
        return Err(Error::Planning(format!(
            "Chunk duration must be positive, got {}",
            seconds
        )));
    }

    let samples = (seconds * sample_rate as f64).floor() as usize;
    if samples == 0 {
        return Err(Error::Planning(format!(
            "Chunk of {}s at {}Hz contains no samples",
            seconds, sample_rate
        )));
    }
    Ok(samples)
}

/// Plan the windows for a channel of `channel_length` samples.
///
/// # Errors
/// [`Error::Planning`] when `chunk_samples` is zero or `overlap_fraction`
/// is outside `[0, 1)`.
pub fn plan_chunks(
    channel_length: usize,
    chunk_samples: usize,
    overlap_fraction: f64,
) -> Result<ChunkPlan> {
    if chunk_samples == 0 {
        return Err(Error::Planning("Chunk size must be positive".to_string()));
    }
    if !overlap_fraction.is_finite() || !(0.0..1.0).contains(&overlap_fraction) {
        return Err(Error::Planning(format!(
            "Overlap fraction must be in [0, 1), got {}",
            overlap_fraction
        )));
    }

    let overlap_enabled = overlap_fraction > 0.0;
    let overlap_samples = if overlap_enabled {
        (chunk_samples as f64 * overlap_fraction).floor() as usize
    } else {
        0
    };
    let stride = chunk_samples - overlap_samples;

    let mut chunks = Vec::new();
    let mut start = 0;
    while start < channel_length {
        let actual_length = chunk_samples.min(channel_length - start);
        chunks.push(ChunkDescriptor {
            index: chunks.len(),
            start_offset: start,
            nominal_length: chunk_samples,
            actual_length,
            is_padded: actual_length < chunk_samples,
        });
        if start + chunk_samples >= channel_length {
            break;
        }
        start += stride;
    }

    debug!(
        "Planned {} chunks of {} samples (overlap {}, stride {}) over {} samples",
        chunks.len(),
        chunk_samples,
        overlap_samples,
        stride,
        channel_length
    );

    Ok(ChunkPlan {
        chunks,
        channel_length,
        chunk_samples,
        overlap_samples,
        stride,
        overlap_enabled,
    })
}

/// Copy a window out of `channel`, zero-padded to its nominal length.
pub fn extract_padded(channel: &[f32], chunk: &ChunkDescriptor) -> Vec<f32> {
    let mut window = Vec::with_capacity(chunk.nominal_length);
    window.extend_from_slice(&channel[chunk.start_offset..chunk.end_offset()]);
    window.resize(chunk.nominal_length, 0.0);
    window
}
