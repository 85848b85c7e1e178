//! Fade curve implementations for chunk crossfading
//!
//! Only complementary curve pairs are offered: for every curve,
//! `fade_in(t) + fade_out(t) == 1` at every position, so two overlapping
//! chunks summed through a crossfade keep the signal level constant across
//! the seam.

use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// Fade curve types for crossfading overlapping chunks
///
/// - Linear: Constant rate of change, v(t) = t
/// - SCurve: Raised cosine, v(t) = 0.5 × (1 - cos(π × t)); smooth at both
///   ends while still summing to one with its fade-out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FadeCurve {
    /// Linear: v(t) = t
    #[default]
    Linear,

    /// S-Curve: v(t) = 0.5 × (1 - cos(π × t))
    #[serde(alias = "scurve", alias = "s-curve", alias = "cosine")]
    SCurve,
}

impl FadeCurve {
    /// Calculate fade-in multiplier at given position
    ///
    /// # Arguments
    /// * `position` - Normalized position through fade (0.0 to 1.0)
    ///
    /// # Returns
    /// Volume multiplier to apply to sample (0.0 = silence, 1.0 = full volume)
    pub fn calculate_fade_in(&self, position: f32) -> f32 {
        let t = position.clamp(0.0, 1.0);

        match self {
            FadeCurve::Linear => t,
            FadeCurve::SCurve => 0.5 * (1.0 - (PI * t).cos()),
        }
    }

    /// Calculate fade-out multiplier at given position
    ///
    /// Defined as the complement of the fade-in so the pair always sums to
    /// one.
    pub fn calculate_fade_out(&self, position: f32) -> f32 {
        1.0 - self.calculate_fade_in(position)
    }

    /// Build a fade-in ramp of `len` samples running from 0.0 to 1.0
    /// inclusive.
    ///
    /// Positions are spaced like `linspace(0, 1, len)`; a one-sample ramp
    /// is `[0.0]`.
    pub fn fade_in_ramp(&self, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| self.calculate_fade_in(ramp_position(i, len)))
            .collect()
    }

    /// Build a fade-out ramp of `len` samples running from 1.0 to 0.0
    /// inclusive.
    pub fn fade_out_ramp(&self, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| self.calculate_fade_out(ramp_position(i, len)))
            .collect()
    }

    /// Get human-readable display name
    pub fn display_name(&self) -> &'static str {
        match self {
            FadeCurve::Linear => "Linear",
            FadeCurve::SCurve => "S-Curve",
        }
    }

    /// Get all available fade curve variants
    pub fn all_variants() -> &'static [FadeCurve] {
        &[FadeCurve::Linear, FadeCurve::SCurve]
    }
}

impl std::fmt::Display for FadeCurve {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

fn ramp_position(i: usize, len: usize) -> f32 {
    if len > 1 {
        i as f32 / (len - 1) as f32
    } else {
        0.0
    }
}
