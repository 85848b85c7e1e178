//! In-process resampling oracle
//!
//! Band-limited sample rate conversion with no generative step. Useful for
//! dry runs of the full pipeline (chunking, loudness matching, overlap-add,
//! ensemble) without a model, and as a deterministic reference.

use super::{OracleError, OracleRequest, UpsamplingOracle};
use crate::audio::Resampler;
use tracing::trace;

/// Oracle that resamples each chunk with rubato
#[derive(Debug, Clone)]
pub struct ResampleOracle {
    output_rate: u32,
    dispatches: usize,
}

impl ResampleOracle {
    pub fn new(output_rate: u32) -> Self {
        Self {
            output_rate,
            dispatches: 0,
        }
    }

    /// Number of chunks processed so far
    pub fn dispatches(&self) -> usize {
        self.dispatches
    }
}

impl UpsamplingOracle for ResampleOracle {
    fn output_rate(&self) -> u32 {
        self.output_rate
    }

    fn upsample(&mut self, request: &OracleRequest<'_>) -> Result<Vec<Vec<f32>>, OracleError> {
        if request.chunk.is_empty() {
            return Err(OracleError::InvalidInput("empty chunk".to_string()));
        }

        let output = Resampler::resample_mono(request.chunk, request.input_rate, self.output_rate)
            .map_err(|e| OracleError::InvalidInput(e.to_string()))?;

        self.dispatches += 1;
        trace!(
            channel = request.channel,
            chunk = request.chunk_index,
            "Resampled {} -> {} samples",
            request.chunk.len(),
            output.len()
        );

        Ok(vec![output])
    }

    fn name(&self) -> &str {
        "resample"
    }
}
