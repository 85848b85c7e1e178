//! Configuration for the audiosr pipeline
//!
//! Settings come from three layers, highest priority first:
//!
//! 1. Command-line arguments ([`ConfigOverrides`])
//! 2. TOML file (`--config`, `AUDIOSR_CONFIG`, or `<config dir>/audiosr/config.toml`)
//! 3. Built-in defaults
//!
//! ```toml
//! [pipeline]
//! chunk_seconds = 10.24
//! overlap = 0.04
//! fade_curve = "linear"        # or "s_curve"
//! parallel_channels = false
//! output_rate = 48000
//!
//! [generation]
//! guidance_scale = 3.5
//! steps = 50
//! seed = 0                     # 0 picks a random seed per run
//!
//! [ensemble]
//! enabled = false
//! input_cutoff = 12000
//! crossover_offset = 1000.0
//! guard_frequency = 23000.0
//!
//! [oracle]
//! kind = "resample"            # or "command"
//! program = "/usr/local/bin/sr-model"
//! args = ["{input}", "{output}", "--seed", "{seed}"]
//!
//! [logging]
//! level = "info"
//! ```

use crate::error::{Error, Result};
use crate::oracle::{CommandOracle, GenerationParams, ResampleOracle, UpsamplingOracle};
use crate::pipeline::{ChunkingOptions, EnsembleSettings};
use audiosr_common::config::{load_toml_or_default, resolve_config_path, LoggingConfig};
use audiosr_common::FadeCurve;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Environment variable naming a config file
pub const CONFIG_ENV_VAR: &str = "AUDIOSR_CONFIG";

/// Application directory name under the platform config dir
pub const APP_NAME: &str = "audiosr";

/// Complete configuration
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct AudioSrConfig {
    #[serde(default)]
    pub pipeline: PipelineSection,

    #[serde(default)]
    pub generation: GenerationSection,

    #[serde(default)]
    pub ensemble: EnsembleSection,

    #[serde(default)]
    pub oracle: OracleSection,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Chunking and scheduling
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PipelineSection {
    /// Chunk duration in seconds
    #[serde(default = "default_chunk_seconds")]
    pub chunk_seconds: f64,

    /// Overlap as a fraction of the chunk
    #[serde(default = "default_overlap")]
    pub overlap: f64,

    #[serde(default)]
    pub fade_curve: FadeCurve,

    /// Reconstruct channels on separate threads
    #[serde(default)]
    pub parallel_channels: bool,

    /// Oracle output rate in Hz
    #[serde(default = "default_output_rate")]
    pub output_rate: u32,
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            chunk_seconds: default_chunk_seconds(),
            overlap: default_overlap(),
            fade_curve: FadeCurve::default(),
            parallel_channels: false,
            output_rate: default_output_rate(),
        }
    }
}

/// Parameters forwarded to the oracle
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct GenerationSection {
    #[serde(default = "default_guidance_scale")]
    pub guidance_scale: f32,

    #[serde(default = "default_steps")]
    pub steps: u32,

    /// 0 = choose a random seed per run
    #[serde(default)]
    pub seed: u64,
}

impl Default for GenerationSection {
    fn default() -> Self {
        Self {
            guidance_scale: default_guidance_scale(),
            steps: default_steps(),
            seed: 0,
        }
    }
}

/// Multiband ensemble
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct EnsembleSection {
    #[serde(default)]
    pub enabled: bool,

    /// Highest frequency trusted in the input (Hz). Input is resampled to
    /// twice this rate before chunking.
    #[serde(default = "default_input_cutoff")]
    pub input_cutoff: u32,

    /// Crossover sits this far below the input cutoff (Hz)
    #[serde(default = "default_crossover_offset")]
    pub crossover_offset: f64,

    #[serde(default = "default_guard_frequency")]
    pub guard_frequency: f64,
}

impl Default for EnsembleSection {
    fn default() -> Self {
        Self {
            enabled: false,
            input_cutoff: default_input_cutoff(),
            crossover_offset: default_crossover_offset(),
            guard_frequency: default_guard_frequency(),
        }
    }
}

/// Which oracle adapter to run
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OracleKind {
    #[default]
    Resample,
    Command,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OracleSection {
    #[serde(default)]
    pub kind: OracleKind,

    /// Program for the command oracle
    #[serde(default)]
    pub program: Option<PathBuf>,

    /// Argument template for the command oracle
    #[serde(default = "default_command_args")]
    pub args: Vec<String>,
}

impl Default for OracleSection {
    fn default() -> Self {
        Self {
            kind: OracleKind::default(),
            program: None,
            args: default_command_args(),
        }
    }
}

fn default_chunk_seconds() -> f64 {
    10.24
}

fn default_overlap() -> f64 {
    0.04
}

fn default_output_rate() -> u32 {
    48000
}

fn default_guidance_scale() -> f32 {
    3.5
}

fn default_steps() -> u32 {
    50
}

fn default_input_cutoff() -> u32 {
    12000
}

fn default_crossover_offset() -> f64 {
    1000.0
}

fn default_guard_frequency() -> f64 {
    23000.0
}

fn default_command_args() -> Vec<String> {
    [
        "--input",
        "{input}",
        "--output",
        "{output}",
        "--seed",
        "{seed}",
        "--guidance-scale",
        "{guidance_scale}",
        "--ddim-steps",
        "{steps}",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Command-line overrides; `None` keeps the file/default value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub chunk_seconds: Option<f64>,
    pub overlap: Option<f64>,
    pub guidance_scale: Option<f32>,
    pub steps: Option<u32>,
    pub seed: Option<u64>,
    pub ensemble: Option<bool>,
    pub input_cutoff: Option<u32>,
    pub oracle_command: Option<PathBuf>,
}

impl AudioSrConfig {
    /// Locate and load the config file, or fall back to defaults.
    pub fn load(cli_path: Option<&Path>) -> Result<Self> {
        let path = resolve_config_path(cli_path, CONFIG_ENV_VAR, APP_NAME);
        Ok(load_toml_or_default(path.as_deref())?)
    }

    /// Parse a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(audiosr_common::config::parse_toml(content)?)
    }

    /// Apply command-line overrides on top of file values.
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(v) = overrides.chunk_seconds {
            self.pipeline.chunk_seconds = v;
        }
        if let Some(v) = overrides.overlap {
            self.pipeline.overlap = v;
        }
        if let Some(v) = overrides.guidance_scale {
            self.generation.guidance_scale = v;
        }
        if let Some(v) = overrides.steps {
            self.generation.steps = v;
        }
        if let Some(v) = overrides.seed {
            self.generation.seed = v;
        }
        if let Some(v) = overrides.ensemble {
            self.ensemble.enabled = v;
        }
        if let Some(v) = overrides.input_cutoff {
            self.ensemble.input_cutoff = v;
        }
        if let Some(program) = &overrides.oracle_command {
            self.oracle.kind = OracleKind::Command;
            self.oracle.program = Some(program.clone());
        }
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        let p = &self.pipeline;
        if !p.chunk_seconds.is_finite() || p.chunk_seconds <= 0.0 {
            return Err(Error::Config(format!(
                "chunk_seconds must be positive, got {}",
                p.chunk_seconds
            )));
        }
        if !p.overlap.is_finite() || !(0.0..1.0).contains(&p.overlap) {
            return Err(Error::Config(format!(
                "overlap must be in [0, 1), got {}",
                p.overlap
            )));
        }
        if p.output_rate == 0 {
            return Err(Error::Config("output_rate must be positive".to_string()));
        }

        let g = &self.generation;
        if g.steps == 0 {
            return Err(Error::Config("steps must be at least 1".to_string()));
        }
        if !g.guidance_scale.is_finite() || g.guidance_scale <= 0.0 {
            return Err(Error::Config(format!(
                "guidance_scale must be positive, got {}",
                g.guidance_scale
            )));
        }

        let e = &self.ensemble;
        if e.input_cutoff == 0 {
            return Err(Error::Config("input_cutoff must be positive".to_string()));
        }
        // Chunks are planned at twice the cutoff, which must not exceed the output rate
        if e.input_cutoff > p.output_rate / 2 {
            return Err(Error::Config(format!(
                "input_cutoff {} Hz exceeds the output Nyquist frequency {} Hz",
                e.input_cutoff,
                p.output_rate / 2
            )));
        }
        if e.enabled {
            let nyquist = p.output_rate as f64 / 2.0;
            let crossover = self.crossover_frequency();
            if crossover <= 0.0 || crossover >= nyquist {
                return Err(Error::Config(format!(
                    "crossover {} Hz (input_cutoff {} - offset {}) must lie in (0, {})",
                    crossover, e.input_cutoff, e.crossover_offset, nyquist
                )));
            }
            if !(e.guard_frequency > 0.0 && e.guard_frequency < nyquist) {
                return Err(Error::Config(format!(
                    "guard_frequency {} Hz must lie in (0, {})",
                    e.guard_frequency, nyquist
                )));
            }
        }

        if self.oracle.kind == OracleKind::Command && self.oracle.program.is_none() {
            return Err(Error::Config(
                "oracle.kind = \"command\" requires oracle.program".to_string(),
            ));
        }

        Ok(())
    }

    /// Rate the input is resampled to before chunking: twice the cutoff
    pub fn planning_rate(&self) -> u32 {
        self.ensemble.input_cutoff.saturating_mul(2)
    }

    pub fn crossover_frequency(&self) -> f64 {
        self.ensemble.input_cutoff as f64 - self.ensemble.crossover_offset
    }

    pub fn chunking_options(&self) -> ChunkingOptions {
        ChunkingOptions {
            chunk_seconds: self.pipeline.chunk_seconds,
            overlap: self.pipeline.overlap,
            fade_curve: self.pipeline.fade_curve,
            parallel_channels: self.pipeline.parallel_channels,
        }
    }

    /// Ensemble settings when the ensemble is enabled
    pub fn ensemble_settings(&self) -> Option<EnsembleSettings> {
        self.ensemble.enabled.then(|| {
            EnsembleSettings::from_input_cutoff(
                self.ensemble.input_cutoff as f64,
                self.ensemble.crossover_offset,
                self.ensemble.guard_frequency,
            )
        })
    }

    /// Seed for this run: the configured one, or a fresh random one for 0
    pub fn resolve_seed(&self) -> u64 {
        match self.generation.seed {
            0 => {
                let seed = rand::random::<u32>() as u64;
                info!("Using random seed {}", seed);
                seed
            }
            seed => seed,
        }
    }

    pub fn generation_params(&self, seed: u64) -> GenerationParams {
        GenerationParams {
            seed: Some(seed),
            guidance_scale: self.generation.guidance_scale,
            steps: self.generation.steps,
        }
    }

    /// Instantiate the configured oracle
    pub fn build_oracle(&self) -> Result<Box<dyn UpsamplingOracle>> {
        match self.oracle.kind {
            OracleKind::Resample => Ok(Box::new(ResampleOracle::new(self.pipeline.output_rate))),
            OracleKind::Command => {
                let program = self.oracle.program.clone().ok_or_else(|| {
                    Error::Config("Command oracle configured without a program".to_string())
                })?;
                Ok(Box::new(CommandOracle::new(
                    program,
                    self.oracle.args.clone(),
                    self.pipeline.output_rate,
                )))
            }
        }
    }
}
