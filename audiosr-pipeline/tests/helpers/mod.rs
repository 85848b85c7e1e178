//! Test helper modules for audiosr-pipeline integration tests
//!
//! Provides reusable test infrastructure components:
//! - Audio generators: sine/noise signals and WAV fixtures
//! - Fake oracles: deterministic, failing, cancelling and recording oracles
//! - Audio analysis: RMS and FFT band energy

#![allow(dead_code)]

pub mod audio_analysis;
pub mod audio_generator;
pub mod fake_oracles;

pub use audio_analysis::{band_energy, max_abs_diff, rms};
pub use audio_generator::{noise, sine, write_sine_wav};
pub use fake_oracles::{
    CancellingOracle, FailingOracle, MultiRowOracle, RecordingOracle, RepeatOracle, ShortOracle,
};
