//! Audio analysis functions for integration tests
//!
//! RMS, sample-wise comparison, and FFT band energy (rustfft).

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

/// Root mean square of a signal
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    (samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32).sqrt()
}

/// Largest absolute sample difference over the common length
pub fn max_abs_diff(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, f32::max)
}

/// Spectral energy between `low_hz` (inclusive) and `high_hz` (exclusive)
pub fn band_energy(samples: &[f32], sample_rate: u32, low_hz: f64, high_hz: f64) -> f64 {
    let n = samples.len();
    if n == 0 {
        return 0.0;
    }

    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(n);
    let mut buffer: Vec<Complex<f64>> = samples
        .iter()
        .map(|&s| Complex::new(s as f64, 0.0))
        .collect();
    fft.process(&mut buffer);

    let bin_hz = sample_rate as f64 / n as f64;
    buffer[..=n / 2]
        .iter()
        .enumerate()
        .filter(|(i, _)| {
            let freq = *i as f64 * bin_hz;
            freq >= low_hz && freq < high_hz
        })
        .map(|(_, c)| c.norm_sqr())
        .sum()
}
