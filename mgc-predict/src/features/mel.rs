//! Mel filterbank, decibel scaling, and MFCC
//!
//! Uses the Slaney mel scale (linear below 1 kHz, logarithmic above) with
//! Slaney area normalization of each filter.

use ndarray::Array2;

const F_SP: f64 = 200.0 / 3.0;
const MIN_LOG_HZ: f64 = 1000.0;
const MIN_LOG_MEL: f64 = MIN_LOG_HZ / F_SP;

fn log_step() -> f64 {
    6.4f64.ln() / 27.0
}

/// Default floor for decibel conversion
pub const AMIN: f32 = 1e-10;

/// Default dynamic range kept by `power_to_db`
pub const TOP_DB: f32 = 80.0;

pub fn hz_to_mel(hz: f64) -> f64 {
    if hz >= MIN_LOG_HZ {
        MIN_LOG_MEL + (hz / MIN_LOG_HZ).ln() / log_step()
    } else {
        hz / F_SP
    }
}

pub fn mel_to_hz(mel: f64) -> f64 {
    if mel >= MIN_LOG_MEL {
        MIN_LOG_HZ * (log_step() * (mel - MIN_LOG_MEL)).exp()
    } else {
        F_SP * mel
    }
}

/// Triangular mel filterbank, shape `[n_mels, n_fft / 2 + 1]`
///
/// Filters span 0 Hz to Nyquist.
pub fn mel_filterbank(sample_rate: u32, n_fft: usize, n_mels: usize) -> Array2<f32> {
    let n_bins = n_fft / 2 + 1;
    let fft_freqs: Vec<f64> = (0..n_bins)
        .map(|k| k as f64 * sample_rate as f64 / n_fft as f64)
        .collect();

    let min_mel = hz_to_mel(0.0);
    let max_mel = hz_to_mel(sample_rate as f64 / 2.0);
    let mel_points: Vec<f64> = (0..n_mels + 2)
        .map(|i| mel_to_hz(min_mel + (max_mel - min_mel) * i as f64 / (n_mels + 1) as f64))
        .collect();

    let mut weights = Array2::<f32>::zeros((n_mels, n_bins));
    for m in 0..n_mels {
        let (lo, center, hi) = (mel_points[m], mel_points[m + 1], mel_points[m + 2]);
        let enorm = 2.0 / (hi - lo);
        for (k, &f) in fft_freqs.iter().enumerate() {
            let lower = (f - lo) / (center - lo);
            let upper = (hi - f) / (hi - center);
            let w = lower.min(upper).max(0.0);
            weights[[m, k]] = (w * enorm) as f32;
        }
    }

    weights
}

/// Project a power spectrogram `[bins, frames]` onto mel bands
pub fn mel_spectrogram(power: &Array2<f32>, filterbank: &Array2<f32>) -> Array2<f32> {
    filterbank.dot(power)
}

/// Convert power to decibels (reference 1.0)
///
/// `10 * log10(max(amin, S))`, then clipped to `top_db` below the peak of
/// the whole array when `top_db` is given.
pub fn power_to_db(power: &Array2<f32>, top_db: Option<f32>) -> Array2<f32> {
    let mut db = power.mapv(|p| 10.0 * p.max(AMIN).log10());
    if let Some(top_db) = top_db {
        let peak = db.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let floor = peak - top_db;
        db.mapv_inplace(|v| v.max(floor));
    }
    db
}

/// Orthonormal DCT-II basis, shape `[n_out, n_in]`
pub fn dct_ortho(n_out: usize, n_in: usize) -> Array2<f32> {
    let n = n_in as f64;
    Array2::from_shape_fn((n_out, n_in), |(k, i)| {
        let scale = if k == 0 { (1.0 / n).sqrt() } else { (2.0 / n).sqrt() };
        let angle = std::f64::consts::PI * k as f64 * (2.0 * i as f64 + 1.0) / (2.0 * n);
        (scale * angle.cos()) as f32
    })
}

/// MFCCs from a power spectrogram, shape `[n_mfcc, frames]`
pub fn mfcc(power: &Array2<f32>, filterbank: &Array2<f32>, n_mfcc: usize) -> Array2<f32> {
    let mel_db = power_to_db(&mel_spectrogram(power, filterbank), Some(TOP_DB));
    dct_ortho(n_mfcc, filterbank.nrows()).dot(&mel_db)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slaney_scale_reference_points() {
        assert!((hz_to_mel(1000.0) - 15.0).abs() < 1e-9);
        assert!((hz_to_mel(500.0) - 7.5).abs() < 1e-9);
        assert!((mel_to_hz(hz_to_mel(4321.0)) - 4321.0).abs() < 1e-6);
        assert!((mel_to_hz(hz_to_mel(123.0)) - 123.0).abs() < 1e-9);
    }

    #[test]
    fn test_filterbank_shape_and_coverage() {
        let fb = mel_filterbank(22050, 1024, 128);
        assert_eq!(fb.shape(), &[128, 513]);
        assert!(fb.iter().all(|&w| w >= 0.0));
        // Upper filters are wide enough to always cover a bin
        assert!(fb.row(127).sum() > 0.0);
    }

    #[test]
    fn test_power_to_db_clips_to_top_db() {
        let power = Array2::from_shape_vec((1, 3), vec![1.0, 1e-3, 1e-12]).unwrap();
        let db = power_to_db(&power, Some(80.0));
        assert!((db[[0, 0]] - 0.0).abs() < 1e-4);
        assert!((db[[0, 1]] + 30.0).abs() < 1e-3);
        assert!((db[[0, 2]] + 80.0).abs() < 1e-3);

        let unclipped = power_to_db(&power, None);
        assert!((unclipped[[0, 2]] + 100.0).abs() < 1e-3);
    }

    #[test]
    fn test_dct_basis_is_orthonormal() {
        let basis = dct_ortho(8, 8);
        let gram = basis.dot(&basis.t());
        for i in 0..8 {
            for j in 0..8 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!((gram[[i, j]] - expected).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn test_dct_of_constant_concentrates_in_first_coefficient() {
        let basis = dct_ortho(4, 16);
        let x = Array2::from_elem((16, 1), 2.0f32);
        let c = basis.dot(&x);
        assert!((c[[0, 0]] - 8.0).abs() < 1e-4); // 2 * sqrt(16)
        for k in 1..4 {
            assert!(c[[k, 0]].abs() < 1e-4);
        }
    }
}
