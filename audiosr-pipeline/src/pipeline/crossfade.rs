//! Crossfade weighting for overlap-add
//!
//! Consecutive chunks share a seam of output samples. The earlier chunk's
//! tail is multiplied by `fade_out` and the later chunk's head by `fade_in`,
//! both of the seam's length; because the two ramps sum to 1 at every
//! position, summing the weighted chunks reproduces a constant-gain signal
//! across the seam. A chunk's head and tail seams may differ by a sample.
//!
//! | Position  | Head      | Tail       |
//! |-----------|-----------|------------|
//! | Only      | untouched | untouched  |
//! | First     | untouched | `fade_out` |
//! | Interior  | `fade_in` | `fade_out` |
//! | Last      | `fade_in` | untouched  |

use crate::pipeline::planner::Seams;
use audiosr_common::FadeCurve;

/// Where a chunk sits in its plan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkPosition {
    /// The plan has a single chunk
    Only,
    First,
    Interior,
    Last,
}

impl ChunkPosition {
    /// Position of chunk `index` in a plan of `count` chunks
    pub fn of(index: usize, count: usize) -> Self {
        match (index, count) {
            (_, 0) | (_, 1) => ChunkPosition::Only,
            (0, _) => ChunkPosition::First,
            (i, n) if i + 1 >= n => ChunkPosition::Last,
            _ => ChunkPosition::Interior,
        }
    }

    fn fades_head(&self) -> bool {
        matches!(self, ChunkPosition::Interior | ChunkPosition::Last)
    }

    fn fades_tail(&self) -> bool {
        matches!(self, ChunkPosition::First | ChunkPosition::Interior)
    }
}

/// Head and tail ramps for one chunk
#[derive(Debug, Clone, PartialEq)]
pub struct CrossfadeWindow {
    pub fade_in: Vec<f32>,
    pub fade_out: Vec<f32>,
}

impl CrossfadeWindow {
    /// Build ramps of `len` samples with the given curve.
    pub fn new(curve: FadeCurve, len: usize) -> Self {
        Self {
            fade_in: curve.fade_in_ramp(len),
            fade_out: curve.fade_out_ramp(len),
        }
    }

    /// Window for a chunk of `keep` samples with the given seams. No ramp
    /// exceeds the chunk itself.
    pub fn for_seams(curve: FadeCurve, seams: Seams, keep: usize) -> Self {
        Self {
            fade_in: curve.fade_in_ramp(seams.head.min(keep)),
            fade_out: curve.fade_out_ramp(seams.tail.min(keep)),
        }
    }

    /// Weight `samples` in place according to its position in the plan.
    pub fn apply(&self, samples: &mut [f32], position: ChunkPosition) {
        if position.fades_head() {
            let len = self.fade_in.len().min(samples.len());
            for (s, g) in samples[..len].iter_mut().zip(&self.fade_in) {
                *s *= g;
            }
        }

        if position.fades_tail() {
            let len = self.fade_out.len().min(samples.len());
            let tail_start = samples.len() - len;
            for (s, g) in samples[tail_start..].iter_mut().zip(&self.fade_out) {
                *s *= g;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_of() {
        assert_eq!(ChunkPosition::of(0, 1), ChunkPosition::Only);
        assert_eq!(ChunkPosition::of(0, 3), ChunkPosition::First);
        assert_eq!(ChunkPosition::of(1, 3), ChunkPosition::Interior);
        assert_eq!(ChunkPosition::of(2, 3), ChunkPosition::Last);
        assert_eq!(ChunkPosition::of(1, 2), ChunkPosition::Last);
    }

    #[test]
    fn test_window_clamped_to_keep() {
        let window = CrossfadeWindow::for_seams(FadeCurve::Linear, Seams { head: 100, tail: 0 }, 40);
        assert_eq!(window.fade_in.len(), 40);
        assert!(window.fade_out.is_empty());
    }

    #[test]
    fn test_uneven_seams() {
        let window = CrossfadeWindow::for_seams(FadeCurve::Linear, Seams { head: 3, tail: 5 }, 10);
        let mut samples = vec![1.0; 10];
        window.apply(&mut samples, ChunkPosition::Interior);
        assert_eq!(samples, vec![0.0, 0.5, 1.0, 1.0, 1.0, 1.0, 0.75, 0.5, 0.25, 0.0]);
    }

    #[test]
    fn test_apply_first_fades_tail_only() {
        let window = CrossfadeWindow::new(FadeCurve::Linear, 3);
        let mut samples = vec![1.0; 6];
        window.apply(&mut samples, ChunkPosition::First);
        assert_eq!(samples, vec![1.0, 1.0, 1.0, 1.0, 0.5, 0.0]);
    }

    #[test]
    fn test_apply_last_fades_head_only() {
        let window = CrossfadeWindow::new(FadeCurve::Linear, 3);
        let mut samples = vec![1.0; 6];
        window.apply(&mut samples, ChunkPosition::Last);
        assert_eq!(samples, vec![0.0, 0.5, 1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_apply_only_untouched() {
        let window = CrossfadeWindow::new(FadeCurve::Linear, 3);
        let mut samples = vec![1.0; 6];
        window.apply(&mut samples, ChunkPosition::Only);
        assert_eq!(samples, vec![1.0; 6]);
    }
}
