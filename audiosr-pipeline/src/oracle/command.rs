//! External-program oracle
//!
//! Each chunk is written as a 32-bit float WAV into the run's scratch
//! directory, the configured program is run once, and the WAV it writes is
//! read back. Arguments may contain placeholders that are substituted per
//! dispatch:
//!
//! | Placeholder        | Value                                   |
//! |--------------------|-----------------------------------------|
//! | `{input}`          | path of the chunk WAV                   |
//! | `{output}`         | path the program must write             |
//! | `{seed}`           | seed, empty when unset                  |
//! | `{guidance_scale}` | guidance scale                          |
//! | `{steps}`          | sampling steps                          |
//! | `{sample_rate}`    | required output sample rate             |

use super::{OracleError, OracleRequest, UpsamplingOracle};
use crate::audio::types::MultiChannelAudio;
use crate::audio::writer::write_f32;
use hound::{SampleFormat, WavReader};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Oracle backed by an external program
#[derive(Debug, Clone)]
pub struct CommandOracle {
    program: PathBuf,
    args: Vec<String>,
    output_rate: u32,
}

impl CommandOracle {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>, output_rate: u32) -> Self {
        Self {
            program: program.into(),
            args,
            output_rate,
        }
    }

    /// Arguments for one dispatch with placeholders substituted
    fn render_args(&self, request: &OracleRequest<'_>, input: &Path, output: &Path) -> Vec<String> {
        let seed = request.params.seed.map(|s| s.to_string()).unwrap_or_default();
        let input = input.to_string_lossy();
        let output = output.to_string_lossy();
        let guidance = request.params.guidance_scale.to_string();
        let steps = request.params.steps.to_string();
        let rate = self.output_rate.to_string();

        self.args
            .iter()
            .map(|arg| {
                arg.replace("{input}", &input)
                    .replace("{output}", &output)
                    .replace("{seed}", &seed)
                    .replace("{guidance_scale}", &guidance)
                    .replace("{steps}", &steps)
                    .replace("{sample_rate}", &rate)
            })
            .collect()
    }

    /// Read the program's output WAV as planar f32
    fn read_output(&self, path: &Path) -> Result<Vec<Vec<f32>>, OracleError> {
        if !path.exists() {
            return Err(OracleError::Process(format!(
                "{} did not write {}",
                self.program.display(),
                path.display()
            )));
        }

        let mut reader = WavReader::open(path)
            .map_err(|e| OracleError::Malformed(format!("{}: {}", path.display(), e)))?;
        let spec = reader.spec();

        if spec.sample_rate != self.output_rate {
            return Err(OracleError::Malformed(format!(
                "output at {}Hz, expected {}Hz",
                spec.sample_rate, self.output_rate
            )));
        }

        let interleaved: Vec<f32> = match spec.sample_format {
            SampleFormat::Float => reader
                .samples::<f32>()
                .collect::<Result<_, _>>()
                .map_err(|e| OracleError::Malformed(e.to_string()))?,
            SampleFormat::Int => {
                let scale = 1.0 / (1u64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 * scale))
                    .collect::<Result<_, _>>()
                    .map_err(|e| OracleError::Malformed(e.to_string()))?
            }
        };

        let audio = MultiChannelAudio::from_interleaved(
            &interleaved,
            spec.channels as usize,
            spec.sample_rate,
        );
        Ok(audio.channels)
    }
}

impl UpsamplingOracle for CommandOracle {
    fn output_rate(&self) -> u32 {
        self.output_rate
    }

    fn upsample(&mut self, request: &OracleRequest<'_>) -> Result<Vec<Vec<f32>>, OracleError> {
        let stem = format!("ch{}_chunk{}", request.channel, request.chunk_index);
        let input = request.scratch.join(format!("{}_in.wav", stem));
        let output = request.scratch.join(format!("{}_out.wav", stem));

        let chunk = MultiChannelAudio::mono(request.chunk.to_vec(), request.input_rate);
        write_f32(&input, &chunk).map_err(|e| OracleError::Process(e.to_string()))?;

        let args = self.render_args(request, &input, &output);
        debug!(
            program = %self.program.display(),
            ?args,
            "Dispatching chunk {} of channel {}",
            request.chunk_index,
            request.channel
        );

        let result = Command::new(&self.program).args(&args).output()?;
        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(OracleError::Process(format!(
                "{} exited with {}: {}",
                self.program.display(),
                result.status,
                stderr.trim()
            )));
        }

        let channels = self.read_output(&output)?;

        // Chunk artifacts are only needed for this dispatch
        for path in [&input, &output] {
            if let Err(e) = std::fs::remove_file(path) {
                debug!("Could not remove {}: {}", path.display(), e);
            }
        }

        Ok(channels)
    }

    fn name(&self) -> &str {
        "command"
    }
}
