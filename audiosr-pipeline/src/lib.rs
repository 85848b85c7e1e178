//! # AudioSR Pipeline Library (audiosr-pipeline)
//!
//! Chunked audio super-resolution: splits arbitrarily long, arbitrarily
//! channeled audio into overlapping windows, sends each window through an
//! upsampling oracle, and reassembles the results into one continuous,
//! loudness-consistent waveform at the oracle's output rate.
//!
//! **Architecture:** symphonia decode → rubato resample → chunk planner →
//! oracle → loudness match (ebur128) → crossfade overlap-add → optional
//! zero-phase multiband ensemble → hound WAV encode
//!
//! Entry points:
//! - [`runner::run_file`]: file in, `SR_<stem>.wav` out
//! - [`session::RunSession`]: in-memory reconstruction with a scratch area
//! - [`pipeline`]: planner, reconstructor, coordinator and ensemble building blocks

pub mod audio;
pub mod config;
pub mod dsp;
pub mod error;
pub mod oracle;
pub mod pipeline;
pub mod runner;
pub mod session;

pub use config::AudioSrConfig;
pub use error::{Error, Result};
pub use oracle::{GenerationParams, OracleError, OracleRequest, UpsamplingOracle};
pub use session::RunSession;
