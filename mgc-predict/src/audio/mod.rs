//! Audio input: decode uploaded bytes into an analysis waveform

pub mod decoder;
pub mod resampler;

pub use decoder::{decode_audio_bytes, DecodedAudio};
pub use resampler::resample_mono;

use crate::error::AudioError;

/// Analysis sample rate (Hz) all features are computed at
pub const ANALYSIS_SAMPLE_RATE: u32 = 22050;

/// Only the first 30 seconds of an upload are analysed
pub const MAX_DURATION_SECS: f64 = 30.0;

/// Mono waveform at a fixed sample rate
///
/// Created per request and consumed by feature extraction.
#[derive(Debug, Clone)]
pub struct Waveform {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl Waveform {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_seconds(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Decode, truncate to 30 s, and resample to the analysis rate
pub fn load_waveform(bytes: &[u8]) -> Result<Waveform, AudioError> {
    let decoded = decode_audio_bytes(bytes, MAX_DURATION_SECS)?;
    let samples = resample_mono(&decoded.samples, decoded.sample_rate, ANALYSIS_SAMPLE_RATE)?;

    tracing::debug!(
        native_rate = decoded.sample_rate,
        channels = decoded.channels,
        truncated = decoded.truncated,
        samples = samples.len(),
        "Waveform ready"
    );

    Ok(Waveform::new(samples, ANALYSIS_SAMPLE_RATE))
}
