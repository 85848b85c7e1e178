//! Deterministic oracles for pipeline tests
//!
//! None of these do real super-resolution. They exist to make the
//! pipeline's bookkeeping observable: exact sample alignment, loudness
//! correction, failure propagation, cancellation and scratch cleanup.

use audiosr_pipeline::oracle::{OracleError, OracleRequest, UpsamplingOracle};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Repeat every input sample `factor` times, scaled by `gain`
fn repeat(chunk: &[f32], factor: usize, gain: f32) -> Vec<f32> {
    chunk
        .iter()
        .flat_map(|&s| std::iter::repeat(s * gain).take(factor))
        .collect()
}

/// Sample-and-hold upsampler: output[k] = input[k / factor] × gain
#[derive(Debug, Clone)]
pub struct RepeatOracle {
    pub factor: usize,
    pub output_rate: u32,
    pub gain: f32,
    pub calls: Arc<AtomicUsize>,
}

impl RepeatOracle {
    /// ×2 upsampler to 48 kHz (for 24 kHz input)
    pub fn doubling() -> Self {
        Self::with_gain(1.0)
    }

    pub fn with_gain(gain: f32) -> Self {
        Self {
            factor: 2,
            output_rate: 48000,
            gain,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl UpsamplingOracle for RepeatOracle {
    fn output_rate(&self) -> u32 {
        self.output_rate
    }

    fn upsample(&mut self, request: &OracleRequest<'_>) -> Result<Vec<Vec<f32>>, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![repeat(request.chunk, self.factor, self.gain)])
    }
}

/// One dispatch as seen by the oracle
#[derive(Debug, Clone)]
pub struct RecordedDispatch {
    pub channel: usize,
    pub chunk_index: usize,
    pub chunk: Vec<f32>,
    pub input_rate: u32,
    pub seed: Option<u64>,
}

/// ×2 sample-and-hold oracle that records every request
#[derive(Debug, Clone, Default)]
pub struct RecordingOracle {
    pub dispatches: Arc<Mutex<Vec<RecordedDispatch>>>,
}

impl UpsamplingOracle for RecordingOracle {
    fn output_rate(&self) -> u32 {
        48000
    }

    fn upsample(&mut self, request: &OracleRequest<'_>) -> Result<Vec<Vec<f32>>, OracleError> {
        self.dispatches.lock().unwrap().push(RecordedDispatch {
            channel: request.channel,
            chunk_index: request.chunk_index,
            chunk: request.chunk.to_vec(),
            input_rate: request.input_rate,
            seed: request.params.seed,
        });
        Ok(vec![repeat(request.chunk, 2, 1.0)])
    }
}

/// Fails on the `fail_at`-th call (0-based), after leaving an artifact in
/// the scratch directory like a real file-based oracle would.
#[derive(Debug, Clone)]
pub struct FailingOracle {
    pub fail_at: usize,
    pub calls: Arc<AtomicUsize>,
}

impl FailingOracle {
    pub fn new(fail_at: usize) -> Self {
        Self {
            fail_at,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl UpsamplingOracle for FailingOracle {
    fn output_rate(&self) -> u32 {
        48000
    }

    fn upsample(&mut self, request: &OracleRequest<'_>) -> Result<Vec<Vec<f32>>, OracleError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let artifact = request
            .scratch
            .join(format!("chunk{}_{}.wav", request.channel, request.chunk_index));
        std::fs::write(&artifact, b"partial")?;

        if call == self.fail_at {
            return Err(OracleError::Resource("out of device memory".to_string()));
        }
        Ok(vec![repeat(request.chunk, 2, 1.0)])
    }
}

/// Raises the cancellation flag once `cancel_after` chunks were served
#[derive(Debug, Clone)]
pub struct CancellingOracle {
    pub cancel_after: usize,
    pub flag: Arc<AtomicBool>,
    pub calls: Arc<AtomicUsize>,
}

impl CancellingOracle {
    pub fn new(cancel_after: usize, flag: Arc<AtomicBool>) -> Self {
        Self {
            cancel_after,
            flag,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl UpsamplingOracle for CancellingOracle {
    fn output_rate(&self) -> u32 {
        48000
    }

    fn upsample(&mut self, request: &OracleRequest<'_>) -> Result<Vec<Vec<f32>>, OracleError> {
        let served = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if served >= self.cancel_after {
            self.flag.store(true, Ordering::SeqCst);
        }
        Ok(vec![repeat(request.chunk, 2, 1.0)])
    }
}

/// Claims 48 kHz but returns the input unchanged (too short)
#[derive(Debug, Clone, Default)]
pub struct ShortOracle;

impl UpsamplingOracle for ShortOracle {
    fn output_rate(&self) -> u32 {
        48000
    }

    fn upsample(&mut self, request: &OracleRequest<'_>) -> Result<Vec<Vec<f32>>, OracleError> {
        Ok(vec![request.chunk.to_vec()])
    }
}

/// Returns two rows for a mono chunk
#[derive(Debug, Clone, Default)]
pub struct MultiRowOracle;

impl UpsamplingOracle for MultiRowOracle {
    fn output_rate(&self) -> u32 {
        48000
    }

    fn upsample(&mut self, request: &OracleRequest<'_>) -> Result<Vec<Vec<f32>>, OracleError> {
        let row = repeat(request.chunk, 2, 1.0);
        Ok(vec![row.clone(), row])
    }
}
