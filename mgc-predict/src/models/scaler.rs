//! Pre-fitted feature normalizer
//!
//! Artifact format (JSON), one of:
//!
//! ```json
//! {"kind": "standard", "mean": [...57], "scale": [...57]}
//! {"kind": "min_max",  "min":  [...57], "scale": [...57]}
//! ```
//!
//! An optional `"feature_names"` array must match the extraction schema
//! exactly when present.

use crate::error::ModelError;
use crate::features::{FeatureVector, FEATURE_COUNT, FEATURE_NAMES};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum ScalerArtifact {
    Standard {
        mean: Vec<f64>,
        scale: Vec<f64>,
        #[serde(default)]
        feature_names: Option<Vec<String>>,
    },
    MinMax {
        min: Vec<f64>,
        scale: Vec<f64>,
        #[serde(default)]
        feature_names: Option<Vec<String>>,
    },
}

/// Per-column affine transform applied to every feature vector
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureScaler {
    /// `(x - mean) / scale`
    Standard { mean: Vec<f64>, scale: Vec<f64> },
    /// `x * scale + min`
    MinMax { min: Vec<f64>, scale: Vec<f64> },
}

impl FeatureScaler {
    /// Standardizer; zero scales are replaced by 1
    pub fn standard(mean: Vec<f64>, scale: Vec<f64>) -> Result<Self, ModelError> {
        check_width("mean", &mean)?;
        check_width("scale", &scale)?;
        let scale = scale
            .into_iter()
            .map(|s| if s == 0.0 { 1.0 } else { s })
            .collect();
        Ok(Self::Standard { mean, scale })
    }

    pub fn min_max(min: Vec<f64>, scale: Vec<f64>) -> Result<Self, ModelError> {
        check_width("min", &min)?;
        check_width("scale", &scale)?;
        Ok(Self::MinMax { min, scale })
    }

    /// Scaler that leaves values unchanged
    pub fn identity() -> Self {
        Self::Standard {
            mean: vec![0.0; FEATURE_COUNT],
            scale: vec![1.0; FEATURE_COUNT],
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        Self::parse(json, Path::new("<inline>"))
    }

    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let text = std::fs::read_to_string(path).map_err(|source| ModelError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let scaler = Self::parse(&text, path)?;
        info!(path = %path.display(), kind = scaler.kind(), "Loaded feature scaler");
        Ok(scaler)
    }

    fn parse(text: &str, path: &Path) -> Result<Self, ModelError> {
        let artifact: ScalerArtifact =
            serde_json::from_str(text).map_err(|e| ModelError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        match artifact {
            ScalerArtifact::Standard {
                mean,
                scale,
                feature_names,
            } => {
                check_names(feature_names.as_deref())?;
                Self::standard(mean, scale)
            }
            ScalerArtifact::MinMax {
                min,
                scale,
                feature_names,
            } => {
                check_names(feature_names.as_deref())?;
                Self::min_max(min, scale)
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Standard { .. } => "standard",
            Self::MinMax { .. } => "min_max",
        }
    }

    /// Scale one feature vector into model input
    pub fn transform(&self, features: &FeatureVector) -> Result<Vec<f32>, ModelError> {
        self.transform_slice(features.as_slice())
    }

    pub fn transform_slice(&self, values: &[f64]) -> Result<Vec<f32>, ModelError> {
        check_width("input", values)?;
        let scaled = match self {
            Self::Standard { mean, scale } => values
                .iter()
                .zip(mean.iter().zip(scale))
                .map(|(&x, (&m, &s))| ((x - m) / s) as f32)
                .collect(),
            Self::MinMax { min, scale } => values
                .iter()
                .zip(min.iter().zip(scale))
                .map(|(&x, (&lo, &s))| (x * s + lo) as f32)
                .collect(),
        };
        Ok(scaled)
    }
}

fn check_width(what: &str, values: &[f64]) -> Result<(), ModelError> {
    if values.len() != FEATURE_COUNT {
        return Err(ModelError::Shape(format!(
            "scaler {} has {} columns, expected {}",
            what,
            values.len(),
            FEATURE_COUNT
        )));
    }
    Ok(())
}

fn check_names(names: Option<&[String]>) -> Result<(), ModelError> {
    let Some(names) = names else {
        return Ok(());
    };
    if names.len() != FEATURE_COUNT {
        return Err(ModelError::Shape(format!(
            "scaler lists {} feature names, expected {}",
            names.len(),
            FEATURE_COUNT
        )));
    }
    for (i, (got, want)) in names.iter().zip(FEATURE_NAMES).enumerate() {
        if got != want {
            return Err(ModelError::Shape(format!(
                "scaler column {} is '{}', expected '{}'",
                i, got, want
            )));
        }
    }
    Ok(())
}
