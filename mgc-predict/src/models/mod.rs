//! Model artifacts: scaler, classifiers, and label decoding
//!
//! The shallow classifier answers with a class index, the deep one with a
//! score per class. Both are loaded once at startup, checked against the
//! feature schema, and shared read-only across requests.

pub mod dense;
pub mod labels;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod scaler;

pub use dense::{Activation, DenseNetwork};
pub use labels::{decode_class_index, decode_scores, Genre, GENRE_COUNT, GENRE_LABELS};
pub use scaler::FeatureScaler;

use crate::error::ModelError;
use std::path::Path;
use std::sync::Arc;

/// Classifier whose output is a single class index
pub trait ClassPredictor: Send + Sync {
    fn predict_class(&self, features: &[f32]) -> Result<usize, ModelError>;
}

/// Classifier whose output is one score per genre
pub trait ScorePredictor: Send + Sync {
    fn predict_scores(&self, features: &[f32]) -> Result<Vec<f32>, ModelError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArtifactFormat {
    Json,
    Onnx,
}

fn artifact_format(path: &Path) -> Result<ArtifactFormat, ModelError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("json") => Ok(ArtifactFormat::Json),
        Some("onnx") => Ok(ArtifactFormat::Onnx),
        _ => Err(ModelError::UnsupportedFormat(format!(
            "{} (expected .json or .onnx)",
            path.display()
        ))),
    }
}

/// Load the shallow classifier, choosing the backend by file extension
pub fn load_class_predictor(path: &Path) -> Result<Arc<dyn ClassPredictor>, ModelError> {
    match artifact_format(path)? {
        ArtifactFormat::Json => Ok(Arc::new(DenseNetwork::load(path)?)),
        ArtifactFormat::Onnx => load_onnx(path).map(|m| m as Arc<dyn ClassPredictor>),
    }
}

/// Load the deep classifier, choosing the backend by file extension
pub fn load_score_predictor(path: &Path) -> Result<Arc<dyn ScorePredictor>, ModelError> {
    match artifact_format(path)? {
        ArtifactFormat::Json => Ok(Arc::new(DenseNetwork::load(path)?)),
        ArtifactFormat::Onnx => load_onnx(path).map(|m| m as Arc<dyn ScorePredictor>),
    }
}

#[cfg(feature = "onnx")]
fn load_onnx(path: &Path) -> Result<Arc<onnx::OnnxModel>, ModelError> {
    Ok(Arc::new(onnx::OnnxModel::load(path)?))
}

#[cfg(not(feature = "onnx"))]
fn load_onnx(path: &Path) -> Result<Arc<NoOnnx>, ModelError> {
    Err(ModelError::UnsupportedFormat(format!(
        "{} requires building with the `onnx` feature",
        path.display()
    )))
}

/// Placeholder so both loader arms have a concrete type without the `onnx` feature
#[cfg(not(feature = "onnx"))]
enum NoOnnx {}

#[cfg(not(feature = "onnx"))]
impl ClassPredictor for NoOnnx {
    fn predict_class(&self, _: &[f32]) -> Result<usize, ModelError> {
        match *self {}
    }
}

#[cfg(not(feature = "onnx"))]
impl ScorePredictor for NoOnnx {
    fn predict_scores(&self, _: &[f32]) -> Result<Vec<f32>, ModelError> {
        match *self {}
    }
}
