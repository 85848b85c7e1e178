//! Zero-phase Butterworth crossover filters
//!
//! A Butterworth of order `n` is built as a cascade of `biquad` sections:
//! one cookbook low/high-pass per conjugate pole pair (Q taken from the pole
//! angle) plus a first-order bilinear section when `n` is odd. The cascade
//! runs forward then backward, which cancels the phase response, so the low
//! band of one signal and the high band of another can be summed without a
//! group delay mismatch at the crossover.
//!
//! The `order` accepted by [`zero_phase_filter`] is the effective order of
//! the forward-backward pass: a Butterworth of `order / 2` is designed and
//! applied twice.

use crate::error::{Error, Result};
use biquad::{Biquad, Coefficients, DirectForm2Transposed, ToHertz, Type};
use std::f64::consts::PI;

/// Low-pass or high-pass response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    Lowpass,
    Highpass,
}

impl FilterKind {
    fn response(self) -> Type<f64> {
        match self {
            FilterKind::Lowpass => Type::LowPass,
            FilterKind::Highpass => Type::HighPass,
        }
    }
}

/// Quality factor of pole pair `pair` in an order-`order` Butterworth
fn pair_q(pair: usize, order: usize) -> f64 {
    let angle = PI * (order - 2 * pair - 1) as f64 / (2 * order) as f64;
    1.0 / (2.0 * angle.cos())
}

/// First-order bilinear section for odd orders
fn first_order(kind: FilterKind, cutoff_hz: f64, sample_rate: f64) -> Coefficients<f64> {
    let k = (PI * cutoff_hz / sample_rate).tan();
    let a1 = (k - 1.0) / (k + 1.0);
    let (b0, b1) = match kind {
        FilterKind::Lowpass => (k / (1.0 + k), k / (1.0 + k)),
        FilterKind::Highpass => (1.0 / (1.0 + k), -1.0 / (1.0 + k)),
    };
    Coefficients { a1, a2: 0.0, b0, b1, b2: 0.0 }
}

fn dc_gain(c: &Coefficients<f64>) -> f64 {
    (c.b0 + c.b1 + c.b2) / (1.0 + c.a1 + c.a2)
}

fn is_first_order(c: &Coefficients<f64>) -> bool {
    c.b2 == 0.0 && c.a2 == 0.0
}

/// Butterworth filter as a cascade of biquad sections.
#[derive(Debug, Clone)]
pub struct ButterworthFilter {
    sections: Vec<Coefficients<f64>>,
    order: usize,
}

impl ButterworthFilter {
    /// Design a digital Butterworth filter.
    ///
    /// # Arguments
    /// * `kind` - Low-pass or high-pass
    /// * `order` - Filter order (one direction), at least 1
    /// * `cutoff_hz` - -3 dB frequency, strictly between 0 and Nyquist
    /// * `sample_rate` - Sample rate in Hz
    pub fn design(kind: FilterKind, order: usize, cutoff_hz: f64, sample_rate: u32) -> Result<Self> {
        if order == 0 {
            return Err(Error::Filter("Butterworth order must be at least 1".to_string()));
        }
        if sample_rate == 0 {
            return Err(Error::Filter("Sample rate must be positive".to_string()));
        }
        let fs = sample_rate as f64;
        let nyquist = fs / 2.0;
        if !cutoff_hz.is_finite() || cutoff_hz <= 0.0 || cutoff_hz >= nyquist {
            return Err(Error::Filter(format!(
                "Cutoff {} Hz must lie strictly between 0 and Nyquist ({} Hz)",
                cutoff_hz, nyquist
            )));
        }

        let mut sections = Vec::with_capacity(order.div_ceil(2));
        for pair in 0..order / 2 {
            let coeffs = Coefficients::<f64>::from_params(
                kind.response(),
                fs.hz(),
                cutoff_hz.hz(),
                pair_q(pair, order),
            )
            .map_err(|e| Error::Filter(format!("Section design failed: {:?}", e)))?;
            sections.push(coeffs);
        }
        if order % 2 == 1 {
            sections.push(first_order(kind, cutoff_hz, fs));
        }

        Ok(Self { sections, order })
    }

    /// Filter order (one direction)
    pub fn order(&self) -> usize {
        self.order
    }

    /// Number of cascaded sections
    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// Single causal pass, each section started in the steady state of a
    /// constant input equal to `x[0]`.
    fn filter_in_place(&self, x: &mut [f64]) {
        let Some(&first) = x.first() else {
            return;
        };

        let mut level = first;
        for coeffs in &self.sections {
            let gain = dc_gain(coeffs);
            let mut section = DirectForm2Transposed::<f64>::new(*coeffs);
            section.s2 = level * (coeffs.b2 - coeffs.a2 * gain);
            section.s1 = level * (gain - coeffs.b0);
            level *= gain;

            for sample in x.iter_mut() {
                *sample = section.run(*sample);
            }
        }
    }

    /// Edge padding length used by [`Self::filtfilt`].
    fn pad_length(&self) -> usize {
        let first_order = self.sections.iter().filter(|c| is_first_order(c)).count();
        3 * (2 * self.sections.len() + 1 - first_order)
    }

    /// Forward-backward (zero-phase) filtering with odd edge extension.
    ///
    /// Signals shorter than the edge padding are padded with as many
    /// samples as they have.
    pub fn filtfilt(&self, input: &[f32]) -> Vec<f32> {
        let n = input.len();
        if n == 0 {
            return Vec::new();
        }

        let pad = self.pad_length().min(n - 1);
        let first = input[0] as f64;
        let last = input[n - 1] as f64;

        let mut ext = Vec::with_capacity(n + 2 * pad);
        ext.extend((1..=pad).rev().map(|i| 2.0 * first - input[i] as f64));
        ext.extend(input.iter().map(|&s| s as f64));
        ext.extend((1..=pad).map(|i| 2.0 * last - input[n - 1 - i] as f64));

        self.filter_in_place(&mut ext);
        ext.reverse();
        self.filter_in_place(&mut ext);
        ext.reverse();

        ext[pad..pad + n].iter().map(|&s| s as f32).collect()
    }
}

fn design_zero_phase(kind: FilterKind, order: usize, cutoff_hz: f64, sample_rate: u32) -> Result<ButterworthFilter> {
    if order < 2 {
        return Err(Error::Filter(format!(
            "Zero-phase order must be at least 2, got {}",
            order
        )));
    }
    ButterworthFilter::design(kind, order / 2, cutoff_hz, sample_rate)
}

/// Zero-phase Butterworth filtering of one channel.
///
/// `order` is the effective order of the forward-backward pass; a
/// Butterworth of `order / 2` is designed, so `order` must be at least 2.
pub fn zero_phase_filter(
    samples: &[f32],
    cutoff_hz: f64,
    kind: FilterKind,
    order: usize,
    sample_rate: u32,
) -> Result<Vec<f32>> {
    let filter = design_zero_phase(kind, order, cutoff_hz, sample_rate)?;
    Ok(filter.filtfilt(samples))
}

/// Zero-phase filtering applied to every channel along the time axis.
pub fn zero_phase_filter_channels(
    channels: &[Vec<f32>],
    cutoff_hz: f64,
    kind: FilterKind,
    order: usize,
    sample_rate: u32,
) -> Result<Vec<Vec<f32>>> {
    let filter = design_zero_phase(kind, order, cutoff_hz, sample_rate)?;
    Ok(channels.iter().map(|ch| filter.filtfilt(ch)).collect())
}
