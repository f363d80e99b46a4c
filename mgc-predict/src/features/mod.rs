//! Acoustic feature extraction
//!
//! Turns a mono waveform into the 57-column [`FeatureVector`] the scaler and
//! both classifiers expect. Spectral descriptors and MFCCs use a 1024-sample
//! window; onset strength ("flux") and spectral contrast use the 2048-sample
//! default window. All share a hop of 512 samples.

pub mod mel;
pub mod rhythm;
pub mod schema;
pub mod spectral;
pub mod stft;
pub mod temporal;

pub use schema::{
    FeatureVector, FeatureVectorBuilder, SeriesStats, DESCRIPTOR_NAMES, FEATURE_COUNT,
    FEATURE_NAMES,
};

use crate::audio::{load_waveform, Waveform};
use crate::error::{FeatureError, PredictResult};
use crate::models::FeatureScaler;
use ndarray::Array2;
use tracing::debug;

/// Analysis window for descriptors with an explicit window size
pub const N_FFT: usize = 1024;

/// Window used where the default analysis window applies
pub const DEFAULT_N_FFT: usize = 2048;

pub const HOP_LENGTH: usize = 512;
pub const N_MELS: usize = 128;
pub const N_MFCC: usize = 20;
pub const ROLL_PERCENT: f32 = 0.85;

pub const CONTRAST_FMIN: f32 = 200.0;
pub const CONTRAST_BANDS: usize = 6;
pub const CONTRAST_QUANTILE: f32 = 0.02;

/// Shortest waveform accepted (the longest analysis window)
pub const MIN_SAMPLES: usize = DEFAULT_N_FFT;

/// Stateless extractor with precomputed filterbanks for one sample rate
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    sample_rate: u32,
    mel_fb: Array2<f32>,
    onset_mel_fb: Array2<f32>,
    freqs: Vec<f32>,
    contrast_freqs: Vec<f32>,
}

impl FeatureExtractor {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            mel_fb: mel::mel_filterbank(sample_rate, N_FFT, N_MELS),
            onset_mel_fb: mel::mel_filterbank(sample_rate, DEFAULT_N_FFT, N_MELS),
            freqs: stft::fft_frequencies(sample_rate, N_FFT),
            contrast_freqs: stft::fft_frequencies(sample_rate, DEFAULT_N_FFT),
        }
    }

    /// Compute the unscaled feature vector
    ///
    /// The waveform must be at the extractor's sample rate.
    pub fn extract(&self, waveform: &Waveform) -> Result<FeatureVector, FeatureError> {
        let y = &waveform.samples;
        if y.len() < MIN_SAMPLES {
            return Err(FeatureError::TooShort {
                samples: y.len(),
                minimum: MIN_SAMPLES,
            });
        }
        if waveform.sample_rate != self.sample_rate {
            return Err(FeatureError::Schema(format!(
                "waveform sample rate {} does not match extractor rate {}",
                waveform.sample_rate, self.sample_rate
            )));
        }

        let magnitude = stft::magnitude_spectrogram(y, N_FFT, HOP_LENGTH);
        let power = stft::power(&magnitude);
        let wide_magnitude = stft::magnitude_spectrogram(y, DEFAULT_N_FFT, HOP_LENGTH);
        let wide_power = stft::power(&wide_magnitude);

        let centroid = spectral::spectral_centroid(&magnitude, &self.freqs);
        let flux = rhythm::onset_strength(&wide_power, &self.onset_mel_fb, DEFAULT_N_FFT, HOP_LENGTH);
        let rmse = temporal::rms(y, N_FFT, HOP_LENGTH);
        let zcr = temporal::zero_crossing_rate(y, N_FFT, HOP_LENGTH);
        let contrast = spectral::spectral_contrast(
            &wide_magnitude,
            &self.contrast_freqs,
            CONTRAST_FMIN,
            CONTRAST_BANDS,
            CONTRAST_QUANTILE,
        );
        let bandwidth = spectral::spectral_bandwidth(&magnitude, &self.freqs);
        let flatness = spectral::spectral_flatness(&power, mel::AMIN);
        let rolloff = spectral::spectral_rolloff(&magnitude, &self.freqs, ROLL_PERCENT);
        let mfcc = mel::mfcc(&power, &self.mel_fb, N_MFCC);

        // Contrast statistics run over every band and frame together
        let contrast_flat: Vec<f32> = contrast.iter().copied().collect();

        let mut builder = FeatureVectorBuilder::new();
        builder
            .push_series("centroid", &centroid)?
            .push_series("flux", &flux)?
            .push_series("rmse", &rmse)?
            .push_series("zcr", &zcr)?
            .push_series("contrast", &contrast_flat)?
            .push_series("bandwidth", &bandwidth)?
            .push_series("flatness", &flatness)?
            .push_series("rolloff", &rolloff)?;
        for (band, row) in mfcc.rows().into_iter().enumerate() {
            let series: Vec<f32> = row.iter().copied().collect();
            builder.push_series(DESCRIPTOR_NAMES[8 + band], &series)?;
        }

        let tempo = rhythm::estimate_tempo(&flux, self.sample_rate, HOP_LENGTH);
        let vector = builder.finish(tempo)?;
        vector.ensure_finite()?;

        debug!(
            frames = magnitude.ncols(),
            tempo = tempo,
            "Extracted {} features",
            FEATURE_COUNT
        );
        Ok(vector)
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new(crate::audio::ANALYSIS_SAMPLE_RATE)
    }
}

/// Decode an upload and compute its unscaled features
pub fn extract_features(bytes: &[u8]) -> PredictResult<FeatureVector> {
    let waveform = load_waveform(bytes)?;
    Ok(FeatureExtractor::new(waveform.sample_rate).extract(&waveform)?)
}

/// Decode, extract, and scale in one step
pub fn extract_scaled_features(bytes: &[u8], scaler: &FeatureScaler) -> PredictResult<Vec<f32>> {
    let features = extract_features(bytes)?;
    Ok(scaler.transform(&features)?)
}
