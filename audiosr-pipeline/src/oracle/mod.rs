//! Upsampling oracle capability
//!
//! The oracle is the external collaborator that turns one mono chunk at the
//! planning rate into a chunk at a fixed output rate. The pipeline only
//! relies on this contract:
//!
//! - output has exactly one row per input channel (one, for mono chunks)
//! - output length is at least `round(input_len × output_rate / input_rate)`
//! - output rate is the constant reported by [`UpsamplingOracle::output_rate`]
//!
//! Two adapters ship with the crate: [`ResampleOracle`] (in-process
//! band-limited resampling) and [`CommandOracle`] (a program invoked once per
//! chunk with WAV files in the run's scratch directory).

pub mod command;
pub mod resample;

pub use command::CommandOracle;
pub use resample::ResampleOracle;

use std::path::Path;
use thiserror::Error;

/// Generation parameters forwarded to the oracle unchanged
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    /// Random seed; `None` lets the oracle choose
    pub seed: Option<u64>,

    /// Classifier-free guidance scale
    pub guidance_scale: f32,

    /// Number of sampling steps
    pub steps: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            seed: Some(42),
            guidance_scale: 3.5,
            steps: 50,
        }
    }
}

/// One oracle dispatch
#[derive(Debug, Clone, Copy)]
pub struct OracleRequest<'a> {
    /// Padded mono chunk at `input_rate`
    pub chunk: &'a [f32],

    /// Sample rate of `chunk`
    pub input_rate: u32,

    pub params: GenerationParams,

    /// Channel being reconstructed
    pub channel: usize,

    /// Chunk index within the channel
    pub chunk_index: usize,

    /// Run-scoped scratch directory for file artifacts
    pub scratch: &'a Path,
}

/// Oracle failure
#[derive(Error, Debug)]
pub enum OracleError {
    /// The oracle could not obtain a resource it needs (model, device, memory)
    #[error("Oracle resource unavailable: {0}")]
    Resource(String),

    /// The request was rejected
    #[error("Invalid oracle input: {0}")]
    InvalidInput(String),

    /// Output shape, length, rate or values violate the contract
    #[error("Malformed oracle output: {0}")]
    Malformed(String),

    /// External oracle process failed
    #[error("Oracle process failed: {0}")]
    Process(String),

    /// Scratch file I/O
    #[error("Oracle I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Maps a mono chunk to a higher sample rate.
///
/// Calls are strictly serialized by the caller; implementations may hold
/// mutable state (loaded weights, a child process, counters).
pub trait UpsamplingOracle: Send {
    /// Fixed output sample rate
    fn output_rate(&self) -> u32;

    /// Upsample one chunk. Returns planar output, one row per channel.
    fn upsample(&mut self, request: &OracleRequest<'_>) -> Result<Vec<Vec<f32>>, OracleError>;

    /// Short name for logging
    fn name(&self) -> &str {
        "oracle"
    }
}

impl<T: UpsamplingOracle + ?Sized> UpsamplingOracle for Box<T> {
    fn output_rate(&self) -> u32 {
        (**self).output_rate()
    }

    fn upsample(&mut self, request: &OracleRequest<'_>) -> Result<Vec<Vec<f32>>, OracleError> {
        (**self).upsample(request)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
