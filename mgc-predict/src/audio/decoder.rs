//! Audio Decoding Utilities
//!
//! **Purpose:** Decode an uploaded byte stream to mono f32 PCM samples
//!
//! Uses symphonia for format-agnostic decoding (MP3, FLAC, AAC, WAV, OGG, ...)

use crate::error::AudioError;
use std::io::Cursor;
use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::conv::FromSample;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::sample::Sample;

/// Decoded audio result
#[derive(Debug)]
pub struct DecodedAudio {
    /// Mono audio samples (f32, range [-1.0, 1.0])
    pub samples: Vec<f32>,
    /// Native sample rate in Hz
    pub sample_rate: u32,
    /// Original channel count
    pub channels: usize,
    /// True if decoding stopped at the duration limit
    pub truncated: bool,
}

impl DecodedAudio {
    pub fn duration_seconds(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Decode in-memory audio to mono f32 PCM samples
///
/// **Algorithm:**
/// 1. Probe format from the byte stream (no extension hint available)
/// 2. Find first audio track
/// 3. Decode packets, averaging all channels to mono
/// 4. Stop once `max_duration_secs` of audio (at the native rate) is collected
///
/// Packets that fail with a recoverable decode error are skipped; any other
/// read or decode failure aborts with an error.
///
/// # Errors
/// * `AudioError::Probe` - not a recognised audio format
/// * `AudioError::NoTrack` / `UnknownSampleRate` - unusable stream
/// * `AudioError::Empty` - stream produced no samples
pub fn decode_audio_bytes(bytes: &[u8], max_duration_secs: f64) -> Result<DecodedAudio, AudioError> {
    tracing::debug!(bytes = bytes.len(), "Decoding audio upload");

    let cursor = Cursor::new(bytes.to_vec());
    let mss = MediaSourceStream::new(Box::new(cursor), Default::default());

    let probed = symphonia::default::get_probe()
        .format(
            &Hint::new(),
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| AudioError::Probe(e.to_string()))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or(AudioError::NoTrack)?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or(AudioError::UnknownSampleRate)?;
    let channel_count = track
        .codec_params
        .channels
        .map(|c| c.count())
        .unwrap_or(1);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| AudioError::Decode(e.to_string()))?;

    let max_samples = (max_duration_secs * sample_rate as f64) as usize;
    let mut samples: Vec<f32> = Vec::with_capacity(max_samples.min(1 << 22));
    let mut truncated = false;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(AudioError::Decode(format!("Error reading packet: {}", e))),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => mix_to_mono(&decoded, &mut samples),
            Err(SymphoniaError::DecodeError(e)) => {
                tracing::debug!("Skipping undecodable packet: {}", e);
                continue;
            }
            Err(e) => return Err(AudioError::Decode(e.to_string())),
        }

        if samples.len() >= max_samples {
            samples.truncate(max_samples);
            truncated = true;
            break;
        }
    }

    if samples.is_empty() {
        return Err(AudioError::Empty);
    }

    tracing::debug!(
        sample_rate,
        channels = channel_count,
        total_samples = samples.len(),
        truncated,
        "Audio decoding complete"
    );

    Ok(DecodedAudio {
        samples,
        sample_rate,
        channels: channel_count,
        truncated,
    })
}

/// Append the mono mix of a decoded buffer to `out`
fn mix_to_mono(decoded: &AudioBufferRef, out: &mut Vec<f32>) {
    match decoded {
        AudioBufferRef::U8(buf) => average_channels(&**buf, out),
        AudioBufferRef::U16(buf) => average_channels(&**buf, out),
        AudioBufferRef::U24(buf) => average_channels(&**buf, out),
        AudioBufferRef::U32(buf) => average_channels(&**buf, out),
        AudioBufferRef::S8(buf) => average_channels(&**buf, out),
        AudioBufferRef::S16(buf) => average_channels(&**buf, out),
        AudioBufferRef::S24(buf) => average_channels(&**buf, out),
        AudioBufferRef::S32(buf) => average_channels(&**buf, out),
        AudioBufferRef::F32(buf) => average_channels(&**buf, out),
        AudioBufferRef::F64(buf) => average_channels(&**buf, out),
    }
}

fn average_channels<S>(buf: &AudioBuffer<S>, out: &mut Vec<f32>)
where
    S: Sample,
    f32: FromSample<S>,
{
    let num_channels = buf.spec().channels.count();
    if num_channels == 0 {
        return;
    }
    let num_frames = buf.frames();
    out.reserve(num_frames);

    for frame_idx in 0..num_frames {
        let mut sum = 0.0f32;
        for ch in 0..num_channels {
            sum += f32::from_sample(buf.chan(ch)[frame_idx]);
        }
        out.push(sum / num_channels as f32);
    }
}
