//! Audio resampling using rubato
//!
//! Converts decoded mono audio to the analysis sample rate.

use crate::error::AudioError;
use rubato::{FastFixedIn, PolynomialDegree, Resampler};
use tracing::debug;

/// Resample mono audio from `input_rate` to `output_rate`.
///
/// The whole clip is processed as a single chunk, so the output length is
/// `input.len() * output_rate / input_rate` (rounded up).
///
/// # Notes
/// If the input is already at `output_rate`, returns a copy without resampling
pub fn resample_mono(input: &[f32], input_rate: u32, output_rate: u32) -> Result<Vec<f32>, AudioError> {
    if input_rate == output_rate {
        debug!("Sample rate already at {}Hz, skipping resample", output_rate);
        return Ok(input.to_vec());
    }
    if input.is_empty() {
        return Err(AudioError::Empty);
    }

    debug!("Resampling from {}Hz to {}Hz", input_rate, output_rate);

    let mut resampler = FastFixedIn::<f32>::new(
        output_rate as f64 / input_rate as f64,
        1.0, // max_relative_ratio (no runtime changes)
        PolynomialDegree::Septic,
        input.len(),
        1,
    )
    .map_err(|e| AudioError::Resample(format!("Failed to create resampler: {}", e)))?;

    let mut output = resampler
        .process(&[input], None)
        .map_err(|e| AudioError::Resample(e.to_string()))?;

    let mono = output.pop().unwrap_or_default();

    debug!(
        "Resampled {} input frames to {} output frames",
        input.len(),
        mono.len()
    );

    Ok(mono)
}
