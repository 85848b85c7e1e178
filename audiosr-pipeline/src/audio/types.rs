//! Core audio data types
//!
//! Audio is held planar (one `Vec<f32>` per channel) throughout the
//! pipeline; interleaving only happens at the file boundaries.

use crate::error::{Error, Result};

/// Planar multichannel audio at a known sample rate.
///
/// **Format:**
/// - Samples are f32 (floating point -1.0 to 1.0)
/// - `channels[c][n]` is frame `n` of channel `c`
#[derive(Debug, Clone, PartialEq)]
pub struct MultiChannelAudio {
    /// One sample vector per channel
    pub channels: Vec<Vec<f32>>,

    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl MultiChannelAudio {
    /// Create from planar channels.
    ///
    /// Fails with [`Error::ShapeMismatch`] if the channels have different
    /// lengths.
    pub fn new(channels: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self> {
        if let Some(first) = channels.first() {
            let expected = first.len();
            if let Some((index, ch)) = channels
                .iter()
                .enumerate()
                .find(|(_, ch)| ch.len() != expected)
            {
                return Err(Error::ShapeMismatch(format!(
                    "channel {} has {} frames, channel 0 has {}",
                    index,
                    ch.len(),
                    expected
                )));
            }
        }

        Ok(Self {
            channels,
            sample_rate,
        })
    }

    /// Single-channel audio
    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            channels: vec![samples],
            sample_rate,
        }
    }

    /// Build from interleaved samples ([L, R, L, R, ...]).
    pub fn from_interleaved(samples: &[f32], channel_count: usize, sample_rate: u32) -> Self {
        Self {
            channels: deinterleave(samples, channel_count),
            sample_rate,
        }
    }

    /// Number of channels
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Number of frames per channel
    pub fn frames(&self) -> usize {
        self.channels.first().map(|c| c.len()).unwrap_or(0)
    }

    /// Duration in seconds
    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }

    /// True when there are no channels or no frames
    pub fn is_empty(&self) -> bool {
        self.frames() == 0
    }

    /// Interleave channels into a single buffer ([L, R, L, R, ...]).
    pub fn to_interleaved(&self) -> Vec<f32> {
        interleave(&self.channels)
    }
}

/// Convert interleaved samples to planar format.
///
/// Input:  [L, R, L, R, L, R, ...]
/// Output: [[L, L, L, ...], [R, R, R, ...]]
///
/// A trailing partial frame is dropped.
pub fn deinterleave(samples: &[f32], channel_count: usize) -> Vec<Vec<f32>> {
    if channel_count == 0 {
        return Vec::new();
    }

    let num_frames = samples.len() / channel_count;
    let mut planar = vec![Vec::with_capacity(num_frames); channel_count];

    for frame in samples.chunks_exact(channel_count) {
        for (ch_idx, &sample) in frame.iter().enumerate() {
            planar[ch_idx].push(sample);
        }
    }

    planar
}

/// Convert planar samples to interleaved format.
///
/// Input:  [[L, L, L, ...], [R, R, R, ...]]
/// Output: [L, R, L, R, L, R, ...]
///
/// Callers must pass equal-length channels; frames beyond the first
/// channel's length are ignored.
pub fn interleave(planar: &[Vec<f32>]) -> Vec<f32> {
    if planar.is_empty() {
        return Vec::new();
    }

    let num_channels = planar.len();
    let num_frames = planar[0].len();
    let mut interleaved = Vec::with_capacity(num_frames * num_channels);

    for frame_idx in 0..num_frames {
        for channel in planar {
            interleaved.push(channel[frame_idx]);
        }
    }

    interleaved
}
