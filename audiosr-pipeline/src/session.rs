//! Run session
//!
//! A session owns everything that lives for exactly one run: the oracle,
//! the scratch directory file-based oracles write into, the loudness meter
//! and the cancellation flag. The scratch directory is removed when the
//! session is closed or dropped, whichever comes first, so oracle failures,
//! cancellation and panics all leave nothing behind.

use crate::audio::types::MultiChannelAudio;
use crate::dsp::loudness::{EbuR128Meter, LoudnessMeter};
use crate::error::{Error, Result};
use crate::oracle::{GenerationParams, UpsamplingOracle};
use crate::pipeline::{reconstruct_audio, ChunkingOptions, Reconstruction, RunResources};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tracing::{debug, info, warn};

/// Prefix of scratch directory names
const SCRATCH_PREFIX: &str = "audiosr-";

/// One reconstruction run
pub struct RunSession {
    oracle: Mutex<Box<dyn UpsamplingOracle>>,
    meter: Box<dyn LoudnessMeter>,
    cancel: Arc<AtomicBool>,
    options: ChunkingOptions,
    scratch: TempDir,
}

impl RunSession {
    /// Create a session with a scratch directory under the system temp dir.
    pub fn new(oracle: Box<dyn UpsamplingOracle>, options: ChunkingOptions) -> Result<Self> {
        let scratch = tempfile::Builder::new().prefix(SCRATCH_PREFIX).tempdir()?;
        Ok(Self::with_scratch(oracle, options, scratch))
    }

    /// Create a session with its scratch directory inside `base`.
    pub fn new_in(
        oracle: Box<dyn UpsamplingOracle>,
        options: ChunkingOptions,
        base: &Path,
    ) -> Result<Self> {
        let scratch = tempfile::Builder::new()
            .prefix(SCRATCH_PREFIX)
            .tempdir_in(base)?;
        Ok(Self::with_scratch(oracle, options, scratch))
    }

    fn with_scratch(oracle: Box<dyn UpsamplingOracle>, options: ChunkingOptions, scratch: TempDir) -> Self {
        debug!(
            oracle = oracle.name(),
            scratch = %scratch.path().display(),
            "Session opened"
        );
        Self {
            oracle: Mutex::new(oracle),
            meter: Box::new(EbuR128Meter),
            cancel: Arc::new(AtomicBool::new(false)),
            options,
            scratch,
        }
    }

    /// Share an existing cancellation flag (e.g. one a signal handler sets)
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = flag;
        self
    }

    /// Replace the loudness meter
    pub fn with_meter(mut self, meter: Box<dyn LoudnessMeter>) -> Self {
        self.meter = meter;
        self
    }

    /// Scratch directory for this run
    pub fn scratch_dir(&self) -> &Path {
        self.scratch.path()
    }

    /// Shared flag; setting it stops the run before the next chunk
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    pub fn options(&self) -> &ChunkingOptions {
        &self.options
    }

    /// Oracle output rate
    pub fn output_rate(&self) -> Result<u32> {
        let oracle = self
            .oracle
            .lock()
            .map_err(|_| Error::Internal("Oracle lock poisoned".to_string()))?;
        Ok(oracle.output_rate())
    }

    /// Reconstruct `audio` (at the planning rate) with this session's oracle.
    pub fn reconstruct(
        &self,
        audio: &MultiChannelAudio,
        params: GenerationParams,
    ) -> Result<Reconstruction> {
        let resources = RunResources {
            meter: self.meter.as_ref(),
            cancel: &self.cancel,
            scratch: self.scratch.path(),
        };

        let result = reconstruct_audio(audio, &self.options, params, &resources, &self.oracle);
        if let Err(e) = &result {
            warn!("Reconstruction failed: {}", e);
        }
        result
    }

    /// Remove the scratch directory, reporting removal errors.
    ///
    /// Dropping the session also removes it, silently.
    pub fn close(self) -> Result<()> {
        let path = self.scratch.path().to_path_buf();
        self.scratch.close()?;
        info!("Removed scratch directory {}", path.display());
        Ok(())
    }
}
