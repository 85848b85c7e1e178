//! Audio decoder using symphonia
//!
//! Decodes any container/codec symphonia supports (WAV, FLAC, MP3, AAC,
//! Vorbis) into planar f32 channels at the file's native sample rate.

use crate::audio::types::MultiChannelAudio;
use crate::error::{Error, Result};
use std::path::Path;
use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::conv::FromSample;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::sample::Sample;
use tracing::{debug, warn};

/// Decode an entire audio file to planar f32 channels.
///
/// **Algorithm:**
/// 1. Open file and probe format
/// 2. Find the default audio track
/// 3. Decode all packets, appending each channel to its own buffer
///
/// Corrupt packets are skipped with a warning; any other read error aborts.
///
/// # Errors
/// * File cannot be opened
/// * Unsupported format, or no audio track
/// * Sample rate or channel layout unknown
pub fn decode_file(path: &Path) -> Result<MultiChannelAudio> {
    debug!(path = %path.display(), "Decoding audio file");

    let file = std::fs::File::open(path)
        .map_err(|e| Error::Decode(format!("Failed to open file {}: {}", path.display(), e)))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(extension);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| Error::Decode(format!("Failed to probe {}: {}", path.display(), e)))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| Error::Decode("No audio track found".to_string()))?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| Error::Decode("Sample rate not found".to_string()))?;
    let channel_count = track
        .codec_params
        .channels
        .map(|c| c.count())
        .ok_or_else(|| Error::Decode("Channel count not found".to_string()))?;

    debug!(
        path = %path.display(),
        sample_rate = sample_rate,
        channels = channel_count,
        "Audio file info"
    );

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| Error::Decode(format!("Failed to create decoder: {}", e)))?;

    let mut channels: Vec<Vec<f32>> = vec![Vec::new(); channel_count];

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(symphonia::core::errors::Error::ResetRequired) => break,
            Err(e) => {
                return Err(Error::Decode(format!("Error reading packet: {}", e)));
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => append_decoded(&decoded, &mut channels),
            Err(symphonia::core::errors::Error::DecodeError(e)) => {
                warn!("Skipping corrupt packet: {}", e);
            }
            Err(e) => return Err(Error::Decode(format!("Decode failed: {}", e))),
        }
    }

    debug!(
        path = %path.display(),
        frames = channels.first().map(|c| c.len()).unwrap_or(0),
        "Audio decoding complete"
    );

    MultiChannelAudio::new(channels, sample_rate)
}

/// Append every channel of a decoded buffer, converted to f32.
fn append_decoded(decoded: &AudioBufferRef, channels: &mut [Vec<f32>]) {
    match decoded {
        AudioBufferRef::U8(buf) => append_planar(&**buf, channels),
        AudioBufferRef::U16(buf) => append_planar(&**buf, channels),
        AudioBufferRef::U24(buf) => append_planar(&**buf, channels),
        AudioBufferRef::U32(buf) => append_planar(&**buf, channels),
        AudioBufferRef::S8(buf) => append_planar(&**buf, channels),
        AudioBufferRef::S16(buf) => append_planar(&**buf, channels),
        AudioBufferRef::S24(buf) => append_planar(&**buf, channels),
        AudioBufferRef::S32(buf) => append_planar(&**buf, channels),
        AudioBufferRef::F32(buf) => append_planar(&**buf, channels),
        AudioBufferRef::F64(buf) => append_planar(&**buf, channels),
    }
}

fn append_planar<S>(buf: &AudioBuffer<S>, channels: &mut [Vec<f32>])
where
    S: Sample,
    f32: FromSample<S>,
{
    let num_channels = buf.spec().channels.count().min(channels.len());
    for (ch_idx, out) in channels.iter_mut().enumerate().take(num_channels) {
        out.extend(buf.chan(ch_idx).iter().map(|&s| f32::from_sample(s)));
    }
}
