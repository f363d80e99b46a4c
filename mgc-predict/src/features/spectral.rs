//! Per-frame spectral shape descriptors
//!
//! Inputs are spectrograms laid out `[bin, frame]` together with the bin
//! center frequencies from [`super::stft::fft_frequencies`].

use super::mel::{power_to_db, TOP_DB};
use ndarray::{Array2, ArrayView1};

/// Columns whose total magnitude is below this are treated as silent
const SILENT: f32 = f32::MIN_POSITIVE;

/// Magnitude-weighted mean frequency of each frame
pub fn spectral_centroid(magnitude: &Array2<f32>, freqs: &[f32]) -> Vec<f32> {
    magnitude
        .columns()
        .into_iter()
        .map(|col| column_centroid(col, freqs))
        .collect()
}

fn column_centroid(col: ArrayView1<f32>, freqs: &[f32]) -> f32 {
    let total: f32 = col.sum();
    if total < SILENT {
        return 0.0;
    }
    col.iter().zip(freqs).map(|(&m, &f)| m * f).sum::<f32>() / total
}

/// Spread of each frame's spectrum around its centroid (p = 2)
pub fn spectral_bandwidth(magnitude: &Array2<f32>, freqs: &[f32]) -> Vec<f32> {
    magnitude
        .columns()
        .into_iter()
        .map(|col| {
            let total: f32 = col.sum();
            if total < SILENT {
                return 0.0;
            }
            let centroid = column_centroid(col, freqs);
            let spread: f32 = col
                .iter()
                .zip(freqs)
                .map(|(&m, &f)| (m / total) * (f - centroid).powi(2))
                .sum();
            spread.sqrt()
        })
        .collect()
}

/// Lowest frequency below which `roll_percent` of the frame's magnitude lies
pub fn spectral_rolloff(magnitude: &Array2<f32>, freqs: &[f32], roll_percent: f32) -> Vec<f32> {
    magnitude
        .columns()
        .into_iter()
        .map(|col| {
            let threshold = roll_percent * col.sum();
            let mut cumulative = 0.0f32;
            for (&m, &f) in col.iter().zip(freqs) {
                cumulative += m;
                if cumulative >= threshold {
                    return f;
                }
            }
            freqs.last().copied().unwrap_or(0.0)
        })
        .collect()
}

/// Geometric mean / arithmetic mean of the floored power spectrum
pub fn spectral_flatness(power: &Array2<f32>, amin: f32) -> Vec<f32> {
    power
        .columns()
        .into_iter()
        .map(|col| {
            let n = col.len() as f64;
            let (log_sum, sum) = col.iter().fold((0.0f64, 0.0f64), |(ls, s), &p| {
                let p = p.max(amin) as f64;
                (ls + p.ln(), s + p)
            });
            ((log_sum / n).exp() / (sum / n)) as f32
        })
        .collect()
}

/// Octave-band spectral contrast, shape `[n_bands + 1, frames]`
///
/// Band edges are `0, fmin, 2*fmin, ..., fmin * 2^n_bands`. For each band
/// the peak and valley are the means of the top and bottom `quantile`
/// fraction of its bins; the result is `dB(peak) - dB(valley)`.
pub fn spectral_contrast(
    magnitude: &Array2<f32>,
    freqs: &[f32],
    fmin: f32,
    n_bands: usize,
    quantile: f32,
) -> Array2<f32> {
    let n_frames = magnitude.ncols();
    let mut edges = vec![0.0f32];
    edges.extend((0..=n_bands).map(|i| fmin * 2f32.powi(i as i32)));

    let mut peak = Array2::<f32>::zeros((n_bands + 1, n_frames));
    let mut valley = Array2::<f32>::zeros((n_bands + 1, n_frames));

    for band in 0..=n_bands {
        let rows = band_rows(freqs, edges[band], edges[band + 1], band, n_bands);
        let Some((rows, selected)) = rows else {
            continue;
        };

        let take = (rint(quantile as f64 * selected as f64) as usize).max(1);
        let mut sorted = vec![0.0f32; rows.len()];
        for t in 0..n_frames {
            for (slot, &k) in sorted.iter_mut().zip(&rows) {
                *slot = magnitude[[k, t]];
            }
            sorted.sort_by(|a, b| a.total_cmp(b));

            let take = take.min(sorted.len());
            valley[[band, t]] = mean(&sorted[..take]);
            peak[[band, t]] = mean(&sorted[sorted.len() - take..]);
        }
    }

    power_to_db(&peak, Some(TOP_DB)) - power_to_db(&valley, Some(TOP_DB))
}

/// Bin rows contributing to one contrast band, plus the selected-bin count
/// used for the quantile size.
///
/// Every band above the first also takes the bin just below its lower edge;
/// the top band extends to Nyquist; every band but the top drops its final
/// row from the statistics.
fn band_rows(
    freqs: &[f32],
    f_low: f32,
    f_high: f32,
    band: usize,
    n_bands: usize,
) -> Option<(Vec<usize>, usize)> {
    let mut selected: Vec<bool> = freqs.iter().map(|&f| f >= f_low && f <= f_high).collect();
    let first = selected.iter().position(|&s| s)?;
    let last = selected.iter().rposition(|&s| s)?;

    if band > 0 && first > 0 {
        selected[first - 1] = true;
    }
    if band == n_bands {
        for s in selected.iter_mut().skip(last + 1) {
            *s = true;
        }
    }

    let mut rows: Vec<usize> = selected
        .iter()
        .enumerate()
        .filter_map(|(k, &s)| s.then_some(k))
        .collect();
    let count = rows.len();
    if band < n_bands {
        rows.pop();
    }
    if rows.is_empty() {
        return None;
    }
    Some((rows, count))
}

/// Round half to even
fn rint(x: f64) -> f64 {
    let r = x.round();
    if (x - x.trunc()).abs() == 0.5 && r % 2.0 != 0.0 {
        r - x.signum()
    } else {
        r
    }
}

fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f32>() / values.len() as f32
    }
}
