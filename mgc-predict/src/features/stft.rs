//! Framing and short-time Fourier transform
//!
//! All spectrogram arrays are laid out `[frequency_bin, frame]`.

use ndarray::Array2;
use rustfft::{num_complex::Complex, FftPlanner};

/// How a signal is extended when frames are centered on sample positions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PadMode {
    /// Zeros
    Constant,
    /// Repeat the first/last sample
    Edge,
}

/// Periodic Hann window (`fftbins=True` convention)
pub fn hann_window(n: usize) -> Vec<f32> {
    (0..n)
        .map(|i| {
            let phase = 2.0 * std::f64::consts::PI * i as f64 / n as f64;
            (0.5 - 0.5 * phase.cos()) as f32
        })
        .collect()
}

/// Pad `pad` samples on both sides of `y`
pub fn pad_both(y: &[f32], pad: usize, mode: PadMode) -> Vec<f32> {
    let (left, right) = match mode {
        PadMode::Constant => (0.0, 0.0),
        PadMode::Edge => (
            y.first().copied().unwrap_or(0.0),
            y.last().copied().unwrap_or(0.0),
        ),
    };

    let mut out = Vec::with_capacity(y.len() + 2 * pad);
    out.resize(pad, left);
    out.extend_from_slice(y);
    out.resize(out.len() + pad, right);
    out
}

/// Number of full frames of `frame_length` at stride `hop`
pub fn frame_count(len: usize, frame_length: usize, hop: usize) -> usize {
    if len < frame_length {
        0
    } else {
        1 + (len - frame_length) / hop
    }
}

/// Iterate over the frames of `y` (no padding)
pub fn frames(y: &[f32], frame_length: usize, hop: usize) -> impl Iterator<Item = &[f32]> {
    (0..frame_count(y.len(), frame_length, hop)).map(move |i| &y[i * hop..i * hop + frame_length])
}

/// Center frequency (Hz) of each STFT bin
pub fn fft_frequencies(sample_rate: u32, n_fft: usize) -> Vec<f32> {
    (0..=n_fft / 2)
        .map(|k| (k as f64 * sample_rate as f64 / n_fft as f64) as f32)
        .collect()
}

/// Centered magnitude spectrogram `|STFT(y)|`
///
/// The signal is zero-padded by `n_fft / 2` on both sides, so frame `t` is
/// centered on sample `t * hop` and there are `1 + len / hop` frames.
/// Returns shape `[n_fft / 2 + 1, n_frames]`.
pub fn magnitude_spectrogram(y: &[f32], n_fft: usize, hop: usize) -> Array2<f32> {
    let padded = pad_both(y, n_fft / 2, PadMode::Constant);
    let n_frames = frame_count(padded.len(), n_fft, hop);
    let n_bins = n_fft / 2 + 1;
    let window = hann_window(n_fft);

    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(n_fft);
    let mut buffer = vec![Complex::new(0.0f32, 0.0); n_fft];

    let mut spec = Array2::<f32>::zeros((n_bins, n_frames));
    for (t, frame) in frames(&padded, n_fft, hop).enumerate() {
        for ((slot, &s), &w) in buffer.iter_mut().zip(frame).zip(&window) {
            *slot = Complex::new(s * w, 0.0);
        }
        fft.process(&mut buffer);
        for (k, c) in buffer.iter().take(n_bins).enumerate() {
            spec[[k, t]] = c.norm();
        }
    }

    spec
}

/// Element-wise square of a magnitude spectrogram
pub fn power(magnitude: &Array2<f32>) -> Array2<f32> {
    magnitude.mapv(|m| m * m)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hann_window_is_periodic() {
        let w = hann_window(4);
        let expected = [0.0, 0.5, 1.0, 0.5];
        for (a, b) in w.iter().zip(expected) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn test_pad_modes() {
        assert_eq!(pad_both(&[1.0, 2.0], 2, PadMode::Constant), vec![0.0, 0.0, 1.0, 2.0, 0.0, 0.0]);
        assert_eq!(pad_both(&[1.0, 2.0], 1, PadMode::Edge), vec![1.0, 1.0, 2.0, 2.0]);
    }

    #[test]
    fn test_centered_frame_count() {
        let y = vec![0.0f32; 22050];
        let spec = magnitude_spectrogram(&y, 1024, 512);
        assert_eq!(spec.shape(), &[513, 1 + 22050 / 512]);
    }

    #[test]
    fn test_sine_peaks_at_expected_bin() {
        let sr = 22050u32;
        let n_fft = 1024;
        // Exactly on bin 40
        let freq = 40.0 * sr as f32 / n_fft as f32;
        let y: Vec<f32> = (0..sr as usize)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sr as f32).sin())
            .collect();
        let spec = magnitude_spectrogram(&y, n_fft, 512);

        let mid = spec.shape()[1] / 2;
        let column = spec.column(mid);
        let peak = column
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(k, _)| k)
            .unwrap();
        assert_eq!(peak, 40);
    }

    #[test]
    fn test_fft_frequencies_span_nyquist() {
        let freqs = fft_frequencies(22050, 1024);
        assert_eq!(freqs.len(), 513);
        assert_eq!(freqs[0], 0.0);
        assert!((freqs[512] - 11025.0).abs() < 1e-3);
    }
}
