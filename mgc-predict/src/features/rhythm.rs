//! Onset strength envelope and tempo estimation
//!
//! Tempo is read off a mean autocorrelation tempogram of the onset envelope,
//! weighted by a log-normal prior centred on `START_BPM`.

use super::mel::{mel_spectrogram, power_to_db, TOP_DB};
use super::stft::hann_window;
use ndarray::Array2;
use rustfft::{num_complex::Complex, FftPlanner};

/// Centre of the tempo prior (BPM)
pub const START_BPM: f64 = 120.0;

/// Width of the tempo prior, in octaves
pub const STD_BPM: f64 = 1.0;

/// Tempogram window length, in seconds
pub const AC_SIZE_SECS: f64 = 8.0;

/// Tempi at or above this are never chosen
pub const MAX_TEMPO: f64 = 320.0;

/// Onset strength from a power spectrogram `[bins, frames]`
///
/// Mel projection, dB scaling, positive first difference averaged across
/// bands. The envelope is shifted right by `1 + n_fft / (2 * hop)` frames so
/// it lines up with the centered STFT, and has one value per STFT frame.
pub fn onset_strength(
    power: &Array2<f32>,
    filterbank: &Array2<f32>,
    n_fft: usize,
    hop: usize,
) -> Vec<f32> {
    let mel_db = power_to_db(&mel_spectrogram(power, filterbank), Some(TOP_DB));
    let (n_bands, n_frames) = mel_db.dim();
    let lag = 1;
    let shift = lag + n_fft / (2 * hop);

    let mut envelope = vec![0.0f32; shift];
    for t in lag..n_frames {
        let flux: f32 = (0..n_bands)
            .map(|b| (mel_db[[b, t]] - mel_db[[b, t - lag]]).max(0.0))
            .sum();
        envelope.push(flux / n_bands as f32);
    }
    envelope.truncate(n_frames);
    envelope
}

/// Tempogram window length in onset frames
pub fn tempogram_window(sample_rate: u32, hop: usize) -> usize {
    (AC_SIZE_SECS * sample_rate as f64 / hop as f64).floor() as usize
}

/// BPM represented by each autocorrelation lag (lag 0 is infinite)
pub fn tempo_frequencies(n_lags: usize, sample_rate: u32, hop: usize) -> Vec<f64> {
    (0..n_lags)
        .map(|k| {
            if k == 0 {
                f64::INFINITY
            } else {
                60.0 * sample_rate as f64 / (hop as f64 * k as f64)
            }
        })
        .collect()
}

/// Local autocorrelation tempogram, shape `[win_length, frames]`
///
/// Each column is the Hann-windowed autocorrelation of the envelope around
/// that frame, scaled so its largest magnitude is 1.
pub fn autocorrelation_tempogram(envelope: &[f32], win_length: usize) -> Array2<f64> {
    let n = envelope.len();
    let padded = pad_linear_ramp(envelope, win_length / 2);
    let window = hann_window(win_length);

    let fft_len = (2 * win_length - 1).next_power_of_two();
    let mut planner = FftPlanner::<f64>::new();
    let forward = planner.plan_fft_forward(fft_len);
    let inverse = planner.plan_fft_inverse(fft_len);
    let mut buffer = vec![Complex::new(0.0f64, 0.0); fft_len];

    let mut tempogram = Array2::<f64>::zeros((win_length, n));
    for t in 0..n {
        let frame = &padded[t..t + win_length];
        for (i, slot) in buffer.iter_mut().enumerate() {
            *slot = match frame.get(i) {
                Some(&v) => Complex::new(v as f64 * window[i] as f64, 0.0),
                None => Complex::new(0.0, 0.0),
            };
        }

        forward.process(&mut buffer);
        for c in buffer.iter_mut() {
            *c = Complex::new(c.norm_sqr(), 0.0);
        }
        inverse.process(&mut buffer);

        let scale = fft_len as f64;
        let mut column = tempogram.column_mut(t);
        for (lag, value) in column.iter_mut().enumerate() {
            *value = buffer[lag].re / scale;
        }

        let peak = column.iter().fold(0.0f64, |m, v| m.max(v.abs()));
        if peak >= f32::MIN_POSITIVE as f64 {
            column.mapv_inplace(|v| v / peak);
        }
    }

    tempogram
}

/// Global tempo estimate (BPM) from an onset envelope
pub fn estimate_tempo(envelope: &[f32], sample_rate: u32, hop: usize) -> f64 {
    let win_length = tempogram_window(sample_rate, hop);
    let bpms = tempo_frequencies(win_length, sample_rate, hop);
    if envelope.is_empty() {
        return START_BPM;
    }

    let tempogram = autocorrelation_tempogram(envelope, win_length);
    let frames = tempogram.ncols() as f64;

    // First lag slow enough to be admissible
    let min_lag = bpms.iter().position(|&b| b < MAX_TEMPO).unwrap_or(0);

    let mut best = (0usize, f64::NEG_INFINITY);
    for (lag, &bpm) in bpms.iter().enumerate() {
        let log_prior = if lag < min_lag {
            f64::NEG_INFINITY
        } else {
            -0.5 * ((bpm.log2() - START_BPM.log2()) / STD_BPM).powi(2)
        };
        let strength = tempogram.row(lag).sum() / frames;
        let score = (1e6 * strength).ln_1p() + log_prior;
        if score > best.1 {
            best = (lag, score);
        }
    }

    bpms[best.0]
}

/// Linear ramp from 0 at the outer ends to the edge values
fn pad_linear_ramp(y: &[f32], pad: usize) -> Vec<f32> {
    let first = y.first().copied().unwrap_or(0.0);
    let last = y.last().copied().unwrap_or(0.0);
    let p = pad as f32;

    let mut out = Vec::with_capacity(y.len() + 2 * pad);
    out.extend((0..pad).map(|i| first * i as f32 / p));
    out.extend_from_slice(y);
    out.extend((0..pad).map(|j| last * (pad - 1 - j) as f32 / p));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::mel::mel_filterbank;
    use crate::features::stft::{magnitude_spectrogram, power};

    fn click_train(bpm: f64, sr: u32, seconds: f64) -> Vec<f32> {
        let mut y = vec![0.0f32; (sr as f64 * seconds) as usize];
        let period = 60.0 / bpm * sr as f64;
        let mut pos = 0.0;
        while (pos as usize) < y.len() {
            let start = pos as usize;
            for (i, s) in y.iter_mut().skip(start).take(64).enumerate() {
                *s = if i % 2 == 0 { 0.9 } else { -0.9 };
            }
            pos += period;
        }
        y
    }

    #[test]
    fn test_window_and_frequencies() {
        assert_eq!(tempogram_window(22050, 512), 344);
        let bpms = tempo_frequencies(4, 22050, 512);
        assert!(bpms[0].is_infinite());
        assert!((bpms[1] - 2583.984375).abs() < 1e-9);
        assert!((bpms[2] - 1291.9921875).abs() < 1e-9);
    }

    #[test]
    fn test_linear_ramp_padding() {
        let padded = pad_linear_ramp(&[4.0, 8.0], 2);
        assert_eq!(padded, vec![0.0, 2.0, 4.0, 8.0, 4.0, 0.0]);
    }

    #[test]
    fn test_onset_strength_has_one_value_per_frame() {
        let sr = 22050;
        let y = click_train(120.0, sr, 2.0);
        let spec = power(&magnitude_spectrogram(&y, 2048, 512));
        let fb = mel_filterbank(sr, 2048, 128);
        let env = onset_strength(&spec, &fb, 2048, 512);

        assert_eq!(env.len(), spec.ncols());
        assert_eq!(&env[..3], &[0.0, 0.0, 0.0]);
        assert!(env.iter().all(|&v| v >= 0.0));
        assert!(env.iter().any(|&v| v > 1.0));
    }

    #[test]
    fn test_tempogram_columns_are_peak_normalized() {
        let env: Vec<f32> = (0..100).map(|i| if i % 10 == 0 { 1.0 } else { 0.0 }).collect();
        let tg = autocorrelation_tempogram(&env, 32);
        assert_eq!(tg.dim(), (32, 100));
        for column in tg.columns() {
            let peak = column.iter().fold(0.0f64, |m, v| m.max(v.abs()));
            assert!(peak == 0.0 || (peak - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_click_train_tempo_is_recovered() {
        let sr = 22050;
        let y = click_train(120.0, sr, 12.0);
        let spec = power(&magnitude_spectrogram(&y, 2048, 512));
        let fb = mel_filterbank(sr, 2048, 128);
        let env = onset_strength(&spec, &fb, 2048, 512);

        let tempo = estimate_tempo(&env, sr, 512);
        assert!((tempo - 120.0).abs() < 8.0, "tempo {}", tempo);
    }

    #[test]
    fn test_tempo_never_exceeds_max() {
        let env = vec![1.0f32; 50];
        let tempo = estimate_tempo(&env, 22050, 512);
        assert!(tempo < MAX_TEMPO);
    }
}
