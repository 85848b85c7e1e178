//! Audio I/O and sample rate conversion
//!
//! Decoding (symphonia), resampling (rubato) and WAV encoding (hound).

pub mod decoder;
pub mod resampler;
pub mod types;
pub mod writer;

pub use decoder::decode_file;
pub use resampler::Resampler;
pub use types::MultiChannelAudio;
