//! Time-domain descriptors: RMS energy and zero-crossing rate

use super::stft::{frames, pad_both, PadMode};

/// Magnitudes at or below this are treated as exact zeros when counting crossings
const ZERO_THRESHOLD: f32 = 1e-10;

/// Root-mean-square energy per centered frame (zero padded)
pub fn rms(y: &[f32], frame_length: usize, hop: usize) -> Vec<f32> {
    let padded = pad_both(y, frame_length / 2, PadMode::Constant);
    frames(&padded, frame_length, hop)
        .map(|frame| {
            let energy: f64 = frame.iter().map(|&s| (s as f64) * (s as f64)).sum();
            (energy / frame_length as f64).sqrt() as f32
        })
        .collect()
}

/// Fraction of sign changes per centered frame (edge padded)
///
/// Near-zero samples count as zero, and zero counts as positive. The first
/// sample of a frame is never a crossing.
pub fn zero_crossing_rate(y: &[f32], frame_length: usize, hop: usize) -> Vec<f32> {
    let padded = pad_both(y, frame_length / 2, PadMode::Edge);
    frames(&padded, frame_length, hop)
        .map(|frame| {
            let crossings = frame
                .windows(2)
                .filter(|pair| is_negative(pair[0]) != is_negative(pair[1]))
                .count();
            crossings as f32 / frame_length as f32
        })
        .collect()
}

fn is_negative(sample: f32) -> bool {
    sample.abs() > ZERO_THRESHOLD && sample < 0.0
}
