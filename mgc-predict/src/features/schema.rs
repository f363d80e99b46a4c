//! Feature vector schema
//!
//! The column order below is the order the scaler and both models were
//! trained with. It is declared once, explicitly, and every extraction is
//! checked against it while the vector is assembled.

use crate::error::FeatureError;
use serde::Serialize;

/// Number of per-frame descriptor series (8 spectral/temporal + 20 MFCC)
pub const DESCRIPTOR_COUNT: usize = 28;

/// Total number of columns (28 series x (mean, var) + tempo)
pub const FEATURE_COUNT: usize = DESCRIPTOR_COUNT * 2 + 1;

const _: () = assert!(FEATURE_COUNT == 57);

/// Descriptor series, in column order
pub const DESCRIPTOR_NAMES: [&str; DESCRIPTOR_COUNT] = [
    "centroid", "flux", "rmse", "zcr", "contrast", "bandwidth", "flatness", "rolloff",
    "mfcc_0", "mfcc_1", "mfcc_2", "mfcc_3", "mfcc_4", "mfcc_5", "mfcc_6", "mfcc_7",
    "mfcc_8", "mfcc_9", "mfcc_10", "mfcc_11", "mfcc_12", "mfcc_13", "mfcc_14", "mfcc_15",
    "mfcc_16", "mfcc_17", "mfcc_18", "mfcc_19",
];

/// Column names, in order
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "centroid_mean", "centroid_var",
    "flux_mean", "flux_var",
    "rmse_mean", "rmse_var",
    "zcr_mean", "zcr_var",
    "contrast_mean", "contrast_var",
    "bandwidth_mean", "bandwidth_var",
    "flatness_mean", "flatness_var",
    "rolloff_mean", "rolloff_var",
    "mfcc_0_mean", "mfcc_0_var",
    "mfcc_1_mean", "mfcc_1_var",
    "mfcc_2_mean", "mfcc_2_var",
    "mfcc_3_mean", "mfcc_3_var",
    "mfcc_4_mean", "mfcc_4_var",
    "mfcc_5_mean", "mfcc_5_var",
    "mfcc_6_mean", "mfcc_6_var",
    "mfcc_7_mean", "mfcc_7_var",
    "mfcc_8_mean", "mfcc_8_var",
    "mfcc_9_mean", "mfcc_9_var",
    "mfcc_10_mean", "mfcc_10_var",
    "mfcc_11_mean", "mfcc_11_var",
    "mfcc_12_mean", "mfcc_12_var",
    "mfcc_13_mean", "mfcc_13_var",
    "mfcc_14_mean", "mfcc_14_var",
    "mfcc_15_mean", "mfcc_15_var",
    "mfcc_16_mean", "mfcc_16_var",
    "mfcc_17_mean", "mfcc_17_var",
    "mfcc_18_mean", "mfcc_18_var",
    "mfcc_19_mean", "mfcc_19_var",
    "tempo",
];

/// Mean and population variance (ddof = 0) of a series
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesStats {
    pub mean: f64,
    pub var: f64,
}

impl SeriesStats {
    /// Two-pass mean/variance; an empty series yields zeros
    pub fn of(series: &[f32]) -> Self {
        if series.is_empty() {
            return Self { mean: 0.0, var: 0.0 };
        }
        let n = series.len() as f64;
        let mean = series.iter().map(|&v| v as f64).sum::<f64>() / n;
        let var = series
            .iter()
            .map(|&v| {
                let d = v as f64 - mean;
                d * d
            })
            .sum::<f64>()
            / n;
        Self { mean, var }
    }
}

/// One row of 57 features in schema order
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    values: [f64; FEATURE_COUNT],
}

impl FeatureVector {
    /// Wrap raw values that are already in schema order
    pub fn from_values(values: [f64; FEATURE_COUNT]) -> Self {
        Self { values }
    }

    /// Build from a slice, checking the length against the schema
    pub fn from_slice(values: &[f64]) -> Result<Self, FeatureError> {
        let values: [f64; FEATURE_COUNT] = values.try_into().map_err(|_| {
            FeatureError::Schema(format!(
                "expected {} values, got {}",
                FEATURE_COUNT,
                values.len()
            ))
        })?;
        Ok(Self { values })
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Value by column name
    pub fn get(&self, name: &str) -> Option<f64> {
        FEATURE_NAMES
            .iter()
            .position(|&n| n == name)
            .map(|idx| self.values[idx])
    }

    pub fn tempo(&self) -> f64 {
        self.values[FEATURE_COUNT - 1]
    }

    /// `(name, value)` pairs in schema order
    pub fn iter_named(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        FEATURE_NAMES.iter().copied().zip(self.values.iter().copied())
    }

    /// Fails on the first NaN or infinite column
    pub fn ensure_finite(&self) -> Result<(), FeatureError> {
        match self.iter_named().find(|(_, v)| !v.is_finite()) {
            Some((name, _)) => Err(FeatureError::NonFinite(name)),
            None => Ok(()),
        }
    }
}

/// Assembles a `FeatureVector`, verifying every series arrives in schema order
#[derive(Debug, Default)]
pub struct FeatureVectorBuilder {
    values: Vec<f64>,
    next_descriptor: usize,
}

impl FeatureVectorBuilder {
    pub fn new() -> Self {
        Self {
            values: Vec::with_capacity(FEATURE_COUNT),
            next_descriptor: 0,
        }
    }

    /// Append `<name>_mean`, `<name>_var` for the next descriptor series
    pub fn push_series(&mut self, name: &str, series: &[f32]) -> Result<&mut Self, FeatureError> {
        let expected = DESCRIPTOR_NAMES.get(self.next_descriptor).ok_or_else(|| {
            FeatureError::Schema(format!("unexpected extra series '{}'", name))
        })?;
        if *expected != name {
            return Err(FeatureError::Schema(format!(
                "series '{}' out of order (expected '{}')",
                name, expected
            )));
        }

        let stats = SeriesStats::of(series);
        self.values.push(stats.mean);
        self.values.push(stats.var);
        self.next_descriptor += 1;
        Ok(self)
    }

    /// Append tempo and finish; all descriptor series must have been pushed
    pub fn finish(mut self, tempo: f64) -> Result<FeatureVector, FeatureError> {
        if self.next_descriptor != DESCRIPTOR_COUNT {
            return Err(FeatureError::Schema(format!(
                "only {} of {} series provided",
                self.next_descriptor, DESCRIPTOR_COUNT
            )));
        }
        self.values.push(tempo);
        FeatureVector::from_slice(&self.values)
    }
}
