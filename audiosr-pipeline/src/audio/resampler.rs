//! Audio resampling using rubato
//!
//! Used to bring the decoded input to the planning rate (`2 × input
//! cutoff`), to build the ensemble reference at the output rate, and by the
//! in-process resampling oracle.
//!
//! Output length is exact: `round(frames × output_rate / input_rate)`. The
//! resampler's group delay is compensated so output frame 0 lines up with
//! input frame 0.

use crate::audio::types::MultiChannelAudio;
use crate::error::{Error, Result};
use rubato::{
    Resampler as RubatoResampler, SincFixedIn, SincInterpolationParameters,
    SincInterpolationType, WindowFunction,
};
use tracing::debug;

/// Audio resampler using rubato for sample rate conversion.
pub struct Resampler;

impl Resampler {
    /// Resample planar channels from `input_rate` to `output_rate`.
    ///
    /// # Notes
    /// If the rates already match, returns a copy without resampling.
    pub fn resample_channels(
        channels: &[Vec<f32>],
        input_rate: u32,
        output_rate: u32,
    ) -> Result<Vec<Vec<f32>>> {
        if input_rate == 0 || output_rate == 0 {
            return Err(Error::Resample(format!(
                "Sample rates must be positive ({} -> {})",
                input_rate, output_rate
            )));
        }

        if input_rate == output_rate {
            debug!("Sample rate already at {}Hz, skipping resample", output_rate);
            return Ok(channels.to_vec());
        }

        let input_frames = channels.first().map(|c| c.len()).unwrap_or(0);
        let expected_frames = expected_output_frames(input_frames, input_rate, output_rate);

        if input_frames == 0 {
            return Ok(vec![Vec::new(); channels.len()]);
        }

        debug!(
            "Resampling {} frames from {}Hz to {}Hz ({} channels)",
            input_frames,
            input_rate,
            output_rate,
            channels.len()
        );

        let mut resampler =
            Self::create_resampler(input_rate, output_rate, channels.len(), input_frames)?;
        let delay = resampler.output_delay();

        let mut planar_output = resampler
            .process(channels, None)
            .map_err(|e| Error::Resample(format!("Resampling failed: {}", e)))?;

        // Flush the filter tail so the delay-compensated output is complete
        let tail = resampler
            .process_partial(None::<&[Vec<f32>]>, None)
            .map_err(|e| Error::Resample(format!("Resampler flush failed: {}", e)))?;

        for (out, rest) in planar_output.iter_mut().zip(tail) {
            out.extend(rest);
        }

        let aligned: Vec<Vec<f32>> = planar_output
            .into_iter()
            .map(|mut channel| {
                let start = delay.min(channel.len());
                channel.drain(..start);
                channel.resize(expected_frames, 0.0);
                channel
            })
            .collect();

        debug!(
            "Resampled {} input frames to {} output frames (delay {})",
            input_frames, expected_frames, delay
        );

        Ok(aligned)
    }

    /// Resample a mono signal.
    pub fn resample_mono(samples: &[f32], input_rate: u32, output_rate: u32) -> Result<Vec<f32>> {
        let mut channels = Self::resample_channels(&[samples.to_vec()], input_rate, output_rate)?;
        Ok(channels.pop().unwrap_or_default())
    }

    /// Resample multichannel audio to `output_rate`.
    pub fn resample_audio(audio: &MultiChannelAudio, output_rate: u32) -> Result<MultiChannelAudio> {
        let channels = Self::resample_channels(&audio.channels, audio.sample_rate, output_rate)?;
        MultiChannelAudio::new(channels, output_rate)
    }

    /// Create a rubato resampler.
    ///
    /// Sinc interpolation, one chunk covering the whole input. The cutoff
    /// sits just below the lower of the two Nyquist frequencies, so content
    /// above the output band is rejected rather than folded back.
    fn create_resampler(
        input_rate: u32,
        output_rate: u32,
        channels: usize,
        chunk_size: usize,
    ) -> Result<SincFixedIn<f32>> {
        let params = SincInterpolationParameters {
            sinc_len: 256,
            f_cutoff: 0.95,
            interpolation: SincInterpolationType::Linear,
            oversampling_factor: 256,
            window: WindowFunction::BlackmanHarris2,
        };

        SincFixedIn::<f32>::new(
            output_rate as f64 / input_rate as f64,
            1.0,
            params,
            chunk_size,
            channels,
        )
        .map_err(|e| Error::Resample(format!("Failed to create resampler: {}", e)))
    }
}

/// Number of frames a resampled signal must have.
pub fn expected_output_frames(input_frames: usize, input_rate: u32, output_rate: u32) -> usize {
    (input_frames as f64 * output_rate as f64 / input_rate as f64).round() as usize
}
