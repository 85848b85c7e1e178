//! WAV encoding using hound
//!
//! The final result is written as 16-bit PCM. Scratch chunks handed to
//! file-based oracles are written as 32-bit float so no precision is lost
//! between the pipeline and the oracle.

use crate::audio::types::MultiChannelAudio;
use crate::error::{Error, Result};
use hound::{SampleFormat, WavSpec, WavWriter};
use std::path::Path;
use tracing::debug;

/// Write audio as 16-bit PCM WAV.
///
/// Samples outside [-1.0, 1.0] are clipped.
pub fn write_pcm16(path: &Path, audio: &MultiChannelAudio) -> Result<()> {
    let spec = WavSpec {
        channels: channel_count_u16(audio)?,
        sample_rate: audio.sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec).map_err(encode_error(path))?;
    for sample in audio.to_interleaved() {
        writer
            .write_sample(f32_to_i16(sample))
            .map_err(encode_error(path))?;
    }
    writer.finalize().map_err(encode_error(path))?;

    debug!(
        path = %path.display(),
        frames = audio.frames(),
        channels = audio.channel_count(),
        "Wrote 16-bit PCM WAV"
    );
    Ok(())
}

/// Write audio as 32-bit float WAV.
pub fn write_f32(path: &Path, audio: &MultiChannelAudio) -> Result<()> {
    let spec = WavSpec {
        channels: channel_count_u16(audio)?,
        sample_rate: audio.sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };

    let mut writer = WavWriter::create(path, spec).map_err(encode_error(path))?;
    for sample in audio.to_interleaved() {
        writer.write_sample(sample).map_err(encode_error(path))?;
    }
    writer.finalize().map_err(encode_error(path))?;
    Ok(())
}

/// Convert a float sample to 16-bit PCM, clipping out-of-range values.
pub fn f32_to_i16(sample: f32) -> i16 {
    let scaled = (sample.clamp(-1.0, 1.0) * 32768.0).round();
    scaled.clamp(i16::MIN as f32, i16::MAX as f32) as i16
}

fn channel_count_u16(audio: &MultiChannelAudio) -> Result<u16> {
    match u16::try_from(audio.channel_count()) {
        Ok(0) | Err(_) => Err(Error::Encode(format!(
            "Cannot write {} channels",
            audio.channel_count()
        ))),
        Ok(n) => Ok(n),
    }
}

fn encode_error(path: &Path) -> impl Fn(hound::Error) -> Error + '_ {
    move |e| Error::Encode(format!("{}: {}", path.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_f32_to_i16_clips() {
        assert_eq!(f32_to_i16(0.0), 0);
        assert_eq!(f32_to_i16(1.0), i16::MAX);
        assert_eq!(f32_to_i16(2.0), i16::MAX);
        assert_eq!(f32_to_i16(-1.0), i16::MIN);
        assert_eq!(f32_to_i16(-3.0), i16::MIN);
        assert_eq!(f32_to_i16(0.5), 16384);
    }

    #[test]
    fn test_write_pcm16_roundtrip_spec() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.wav");
        let audio = MultiChannelAudio::new(vec![vec![0.25; 100], vec![-0.25; 100]], 48000).unwrap();

        write_pcm16(&path, &audio).unwrap();

        let reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 2);
        assert_eq!(spec.sample_rate, 48000);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(spec.sample_format, SampleFormat::Int);
        assert_eq!(reader.duration(), 100);
    }

    #[test]
    fn test_write_rejects_zero_channels() {
        let dir = tempfile::tempdir().unwrap();
        let audio = MultiChannelAudio::new(Vec::new(), 48000).unwrap();
        let result = write_pcm16(&dir.path().join("x.wav"), &audio);
        assert!(matches!(result, Err(Error::Encode(_))));
    }
}
