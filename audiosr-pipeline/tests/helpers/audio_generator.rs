//! Audio Test Signal Generation Utilities
//!
//! Deterministic signals for pipeline tests:
//! - Sine waves at specific frequencies
//! - Seeded white noise
//! - WAV fixture files (16-bit PCM via hound)

use hound::{WavSpec, WavWriter};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::PI;
use std::path::Path;

/// Sine wave of `frames` samples
pub fn sine(frequency_hz: f32, amplitude: f32, sample_rate: u32, frames: usize) -> Vec<f32> {
    (0..frames)
        .map(|i| amplitude * (2.0 * PI * frequency_hz * i as f32 / sample_rate as f32).sin())
        .collect()
}

/// Uniform white noise in [-amplitude, amplitude], reproducible per seed
pub fn noise(amplitude: f32, frames: usize, seed: u64) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..frames)
        .map(|_| rng.gen_range(-amplitude..=amplitude))
        .collect()
}

/// Generate a sine wave WAV file
///
/// Every channel carries the same tone, each at a slightly different
/// frequency (`frequency_hz × (1 + 0.1 × channel)`) so channel mix-ups are
/// detectable.
///
/// # Arguments
/// * `path` - Output file path
/// * `channels` - Channel count
/// * `sample_rate` - Sample rate in Hz
/// * `duration_ms` - Duration in milliseconds
/// * `frequency_hz` - Base frequency
/// * `amplitude` - Amplitude 0.0-1.0 (0.5 recommended to avoid clipping)
pub fn write_sine_wav<P: AsRef<Path>>(
    path: P,
    channels: u16,
    sample_rate: u32,
    duration_ms: u64,
    frequency_hz: f32,
    amplitude: f32,
) -> Result<(), hound::Error> {
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec)?;
    let total_frames = (sample_rate as u64 * duration_ms) / 1000;

    for frame in 0..total_frames {
        let t = frame as f32 / sample_rate as f32;
        for ch in 0..channels {
            let freq = frequency_hz * (1.0 + 0.1 * ch as f32);
            let value = amplitude * (2.0 * PI * freq * t).sin();
            writer.write_sample((value * i16::MAX as f32) as i16)?;
        }
    }

    writer.finalize()?;
    Ok(())
}
