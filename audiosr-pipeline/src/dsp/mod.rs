//! Signal processing primitives: loudness metering and crossover filters

pub mod crossover;
pub mod loudness;

pub use crossover::{zero_phase_filter, FilterKind};
pub use loudness::{EbuR128Meter, Loudness, LoudnessMeter};
