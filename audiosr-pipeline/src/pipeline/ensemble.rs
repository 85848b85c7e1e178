//! Multiband ensemble
//!
//! Keeps the original content below the crossover and takes only the band
//! above it from the reconstruction:
//!
//! ```text
//! low  = lowpass(reference, crossover, 10)
//! high = lowpass(highpass(reconstructed, crossover, 10), guard, 2)
//! out  = low + high
//! ```
//!
//! The reconstructed path is first length-matched to the reference so the
//! result has exactly the reference's shape.

use crate::audio::types::MultiChannelAudio;
use crate::dsp::crossover::{zero_phase_filter_channels, FilterKind};
use crate::error::{Error, Result};
use tracing::debug;

/// Effective zero-phase order of the crossover split
pub const CROSSOVER_ORDER: usize = 10;

/// Effective zero-phase order of the guard low-pass on the high band
pub const GUARD_ORDER: usize = 2;

/// Default guard frequency in Hz
pub const DEFAULT_GUARD_FREQUENCY: f64 = 23000.0;

/// Crossover settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnsembleSettings {
    /// Split frequency between reference and reconstruction (Hz)
    pub crossover_frequency: f64,

    /// Upper limit applied to the reconstructed band (Hz)
    pub guard_frequency: f64,
}

impl EnsembleSettings {
    /// Crossover derived from the input cutoff: `input_cutoff − offset`
    pub fn from_input_cutoff(input_cutoff: f64, crossover_offset: f64, guard_frequency: f64) -> Self {
        Self {
            crossover_frequency: input_cutoff - crossover_offset,
            guard_frequency,
        }
    }
}

/// Truncate or zero-pad every channel to `target_len` frames.
pub fn match_length(channels: &[Vec<f32>], target_len: usize) -> Vec<Vec<f32>> {
    channels
        .iter()
        .map(|ch| {
            let mut out = ch.clone();
            out.resize(target_len, 0.0);
            out
        })
        .collect()
}

/// Blend the reconstruction with a reference at the same sample rate.
///
/// # Errors
/// - [`Error::ShapeMismatch`] when channel counts or sample rates differ
/// - [`Error::Filter`] when a cutoff is not strictly inside (0, Nyquist)
pub fn blend(
    reconstructed: &MultiChannelAudio,
    reference: &MultiChannelAudio,
    settings: &EnsembleSettings,
) -> Result<MultiChannelAudio> {
    if reconstructed.channel_count() != reference.channel_count() {
        return Err(Error::ShapeMismatch(format!(
            "reconstruction has {} channels, reference has {}",
            reconstructed.channel_count(),
            reference.channel_count()
        )));
    }
    if reconstructed.sample_rate != reference.sample_rate {
        return Err(Error::ShapeMismatch(format!(
            "reconstruction at {}Hz, reference at {}Hz",
            reconstructed.sample_rate, reference.sample_rate
        )));
    }

    let rate = reference.sample_rate;
    let frames = reference.frames();
    debug!(
        "Ensemble: crossover {}Hz, guard {}Hz, {} -> {} frames",
        settings.crossover_frequency,
        settings.guard_frequency,
        reconstructed.frames(),
        frames
    );

    let matched = match_length(&reconstructed.channels, frames);

    let low = zero_phase_filter_channels(
        &reference.channels,
        settings.crossover_frequency,
        FilterKind::Lowpass,
        CROSSOVER_ORDER,
        rate,
    )?;
    let high = zero_phase_filter_channels(
        &matched,
        settings.crossover_frequency,
        FilterKind::Highpass,
        CROSSOVER_ORDER,
        rate,
    )?;
    let high = zero_phase_filter_channels(
        &high,
        settings.guard_frequency,
        FilterKind::Lowpass,
        GUARD_ORDER,
        rate,
    )?;

    let channels = low
        .into_iter()
        .zip(high)
        .map(|(l, h)| l.iter().zip(&h).map(|(a, b)| a + b).collect())
        .collect();

    MultiChannelAudio::new(channels, rate)
}
