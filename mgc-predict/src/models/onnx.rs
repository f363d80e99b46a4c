//! ONNX Runtime backend for exported classifiers
//!
//! Expects a single `[1, 57]` float input. For scores the first output must
//! hold 10 floats. For class prediction an integer first output (as emitted
//! by scikit-learn converters) is used directly, otherwise the scores are
//! reduced with argmax. Both widths are checked when the model is loaded.

use super::labels::{argmax, GENRE_COUNT};
use super::{ClassPredictor, ScorePredictor};
use crate::error::ModelError;
use crate::features::FEATURE_COUNT;
use ndarray::Array2;
use ort::session::Session;
use ort::tensor::TensorElementType;
use ort::value::{Tensor, ValueType};
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

pub struct OnnxModel {
    session: Mutex<Session>,
    input_name: String,
}

impl OnnxModel {
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let session = Session::builder()
            .and_then(|b| b.with_intra_threads(1))
            .and_then(|b| b.commit_from_file(path))
            .map_err(|e| ModelError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        let input = session
            .inputs
            .first()
            .ok_or_else(|| ModelError::Shape("ONNX model declares no inputs".to_string()))?;
        check_tensor_width("input", &input.input_type, FEATURE_COUNT)?;
        let input_name = input.name.clone();

        let output = session
            .outputs
            .first()
            .ok_or_else(|| ModelError::Shape("ONNX model declares no outputs".to_string()))?;
        // Integer outputs are class labels, one per row
        if output.output_type.tensor_type() != Some(TensorElementType::Int64) {
            check_tensor_width("output", &output.output_type, GENRE_COUNT)?;
        }

        info!(path = %path.display(), input = %input_name, "Loaded ONNX model");
        Ok(Self {
            session: Mutex::new(session),
            input_name,
        })
    }

    fn run<T, F>(&self, features: &[f32], read: F) -> Result<T, ModelError>
    where
        F: FnOnce(&ort::value::DynValue) -> Result<T, ModelError>,
    {
        if features.len() != FEATURE_COUNT {
            return Err(ModelError::Shape(format!(
                "input has {} values, expected {}",
                features.len(),
                FEATURE_COUNT
            )));
        }

        let input = Array2::from_shape_vec((1, FEATURE_COUNT), features.to_vec())
            .map_err(|e| ModelError::Shape(e.to_string()))?;
        let tensor =
            Tensor::from_array(input).map_err(|e| ModelError::Inference(e.to_string()))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| ModelError::Inference("ONNX session lock poisoned".to_string()))?;
        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => tensor])
            .map_err(|e| ModelError::Inference(e.to_string()))?;

        let (_, first) = outputs
            .iter()
            .next()
            .ok_or_else(|| ModelError::Inference("model produced no output".to_string()))?;
        read(&first)
    }
}

fn check_tensor_width(
    role: &str,
    value_type: &ValueType,
    expected: usize,
) -> Result<(), ModelError> {
    let dims = value_type.tensor_shape().ok_or_else(|| {
        ModelError::Shape(format!("ONNX model {} is not a tensor", role))
    })?;
    check_last_dim(role, dims, expected)
}

/// Negative dimensions are symbolic and accepted
fn check_last_dim(role: &str, dims: &[i64], expected: usize) -> Result<(), ModelError> {
    match dims.last() {
        Some(&width) if width < 0 || width as usize == expected => Ok(()),
        Some(&width) => Err(ModelError::Shape(format!(
            "ONNX model {} has width {}, expected {}",
            role, width, expected
        ))),
        None => Err(ModelError::Shape(format!(
            "ONNX model {} is a scalar, expected width {}",
            role, expected
        ))),
    }
}

impl ScorePredictor for OnnxModel {
    fn predict_scores(&self, features: &[f32]) -> Result<Vec<f32>, ModelError> {
        self.run(features, |value| {
            let (_shape, data) = value
                .try_extract_tensor::<f32>()
                .map_err(|e| ModelError::Inference(e.to_string()))?;
            Ok(data.to_vec())
        })
    }
}

impl ClassPredictor for OnnxModel {
    fn predict_class(&self, features: &[f32]) -> Result<usize, ModelError> {
        self.run(features, |value| {
            if let Ok((_shape, labels)) = value.try_extract_tensor::<i64>() {
                let label = labels
                    .first()
                    .copied()
                    .ok_or(ModelError::NoFiniteScores)?;
                return usize::try_from(label)
                    .map_err(|_| ModelError::Inference(format!("negative class label {}", label)));
            }
            let (_shape, scores) = value
                .try_extract_tensor::<f32>()
                .map_err(|e| ModelError::Inference(e.to_string()))?;
            argmax(scores).ok_or(ModelError::NoFiniteScores)
        })
    }
}
