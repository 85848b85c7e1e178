//! # AudioSR Common Library
//!
//! Shared code for the AudioSR workspace:
//! - Error types
//! - Configuration file discovery and TOML loading
//! - Crossfade curve definitions and ramp generation

pub mod config;
pub mod error;
pub mod fade_curves;

pub use error::{Error, Result};
pub use fade_curves::FadeCurve;
