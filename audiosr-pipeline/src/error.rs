//! Error types for audiosr-pipeline
//!
//! Fatal errors carry enough context (channel and chunk index) to reproduce
//! the failing dispatch. An undefined loudness measurement is not an error:
//! see [`crate::dsp::loudness::Loudness::Undefined`].

use crate::oracle::OracleError;
use thiserror::Error;

/// Main error type for the reconstruction pipeline
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid chunking configuration, rejected before any oracle dispatch
    #[error("Planning error: {0}")]
    Planning(String),

    /// The upsampling oracle failed or returned a malformed chunk
    #[error("Oracle failed on channel {channel}, chunk {chunk}: {source}")]
    Oracle {
        channel: usize,
        chunk: usize,
        #[source]
        source: OracleError,
    },

    /// Channel counts or lengths disagree where they must match
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Cancellation was requested before the given chunk was dispatched
    #[error("Run cancelled before channel {channel}, chunk {chunk}")]
    Cancelled { channel: usize, chunk: usize },

    /// Audio decoding errors
    #[error("Audio decode error: {0}")]
    Decode(String),

    /// Audio encoding errors
    #[error("Audio encode error: {0}")]
    Encode(String),

    /// Sample rate conversion errors
    #[error("Resample error: {0}")]
    Resample(String),

    /// Invalid crossover filter parameters
    #[error("Filter error: {0}")]
    Filter(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors from the shared crate
    #[error(transparent)]
    Common(#[from] audiosr_common::Error),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience Result type using the pipeline Error
pub type Result<T> = std::result::Result<T, Error>;
