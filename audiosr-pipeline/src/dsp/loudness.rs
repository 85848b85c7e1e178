//! Integrated loudness measurement and loudness matching
//!
//! Measurement follows ITU-R BS.1770 (K-weighting, 400 ms gating blocks,
//! absolute gate at -70 LUFS, relative gate 10 LU below the ungated mean)
//! via the `ebur128` crate.
//!
//! Signals shorter than one gating block, silence, and anything the meter
//! rejects produce [`Loudness::Undefined`] instead of an error. Callers skip
//! loudness matching for such chunks.

use ebur128::{EbuR128, Mode};
use tracing::debug;

/// Duration of one BS.1770 gating block in seconds
pub const GATING_BLOCK_SECONDS: f64 = 0.4;

/// Result of an integrated loudness measurement
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Loudness {
    /// Integrated loudness in LUFS
    Measured(f64),

    /// Too short, silent, or otherwise unmeasurable
    Undefined,
}

impl Loudness {
    /// Wrap a raw meter value; non-finite values are undefined.
    pub fn from_lufs(value: f64) -> Self {
        if value.is_finite() {
            Loudness::Measured(value)
        } else {
            Loudness::Undefined
        }
    }

    /// The measured value, if any
    pub fn lufs(&self) -> Option<f64> {
        match self {
            Loudness::Measured(v) => Some(*v),
            Loudness::Undefined => None,
        }
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, Loudness::Measured(_))
    }
}

impl std::fmt::Display for Loudness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Loudness::Measured(v) => write!(f, "{:.2} LUFS", v),
            Loudness::Undefined => write!(f, "undefined"),
        }
    }
}

/// Measures integrated loudness of a mono signal.
///
/// Implementations must be stateless across calls so a single meter can be
/// shared by every channel of a run.
pub trait LoudnessMeter: Send + Sync {
    fn integrated_loudness(&self, samples: &[f32], sample_rate: u32) -> Loudness;
}

/// BS.1770 integrated loudness meter backed by `ebur128`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EbuR128Meter;

impl LoudnessMeter for EbuR128Meter {
    fn integrated_loudness(&self, samples: &[f32], sample_rate: u32) -> Loudness {
        if sample_rate == 0 {
            return Loudness::Undefined;
        }

        let min_samples = (GATING_BLOCK_SECONDS * sample_rate as f64).ceil() as usize;
        if samples.len() < min_samples {
            debug!(
                "Signal of {} samples shorter than one gating block ({}), loudness undefined",
                samples.len(),
                min_samples
            );
            return Loudness::Undefined;
        }

        let mut meter = match EbuR128::new(1, sample_rate, Mode::I) {
            Ok(meter) => meter,
            Err(e) => {
                debug!("Loudness meter rejected {}Hz: {:?}", sample_rate, e);
                return Loudness::Undefined;
            }
        };

        if let Err(e) = meter.add_frames_f32(samples) {
            debug!("Loudness meter failed to ingest samples: {:?}", e);
            return Loudness::Undefined;
        }

        match meter.loudness_global() {
            Ok(lufs) => Loudness::from_lufs(lufs),
            Err(e) => {
                debug!("Loudness meter failed to integrate: {:?}", e);
                Loudness::Undefined
            }
        }
    }
}

/// Linear gain that moves a signal from `current` to `target` LUFS.
pub fn gain_for(current: f64, target: f64) -> f64 {
    10f64.powf((target - current) / 20.0)
}

/// Rescale `samples` in place from `current` LUFS to `target` LUFS.
pub fn normalize(samples: &mut [f32], current: f64, target: f64) {
    let gain = gain_for(current, target);
    for s in samples.iter_mut() {
        *s = (*s as f64 * gain) as f32;
    }
}

/// Rescale a waveform in place so its loudness moves from `current` to
/// `target`.
///
/// Returns the applied gain in dB, or `None` when either loudness is
/// undefined and the samples were left untouched.
pub fn rescale_to_match(target: Loudness, current: Loudness, samples: &mut [f32]) -> Option<f64> {
    let (Loudness::Measured(target), Loudness::Measured(current)) = (target, current) else {
        return None;
    };

    normalize(samples, current, target);
    Some(target - current)
}
