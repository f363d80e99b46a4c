//! Fully-connected feedforward network loaded from a JSON artifact
//!
//! ```json
//! {
//!   "layers": [
//!     {"weights": [[...n_out] ...n_in], "bias": [...n_out], "activation": "relu"},
//!     ...
//!   ],
//!   "classes": [0, 1, 2, 3, 4, 5, 6, 7, 8, 9]
//! }
//! ```
//!
//! Weights are stored input-major (`x · W + b`), the layout scikit-learn's
//! `coefs_` and Keras `Dense` kernels export to. `classes` is optional and
//! maps output positions to genre indices.

use super::labels::{argmax, GENRE_COUNT};
use super::{ClassPredictor, ScorePredictor};
use crate::error::ModelError;
use crate::features::FEATURE_COUNT;
use ndarray::{Array1, Array2};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    Identity,
    Relu,
    Tanh,
    Logistic,
    Softmax,
}

impl Activation {
    fn apply(self, v: &mut Array1<f32>) {
        match self {
            Activation::Identity => {}
            Activation::Relu => v.mapv_inplace(|x| x.max(0.0)),
            Activation::Tanh => v.mapv_inplace(f32::tanh),
            Activation::Logistic => v.mapv_inplace(|x| 1.0 / (1.0 + (-x).exp())),
            Activation::Softmax => {
                let max = v.iter().copied().fold(f32::NEG_INFINITY, f32::max);
                v.mapv_inplace(|x| (x - max).exp());
                let sum = v.sum();
                if sum > 0.0 {
                    v.mapv_inplace(|x| x / sum);
                }
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct LayerArtifact {
    weights: Vec<Vec<f32>>,
    bias: Vec<f32>,
    #[serde(default = "default_activation")]
    activation: Activation,
}

fn default_activation() -> Activation {
    Activation::Identity
}

#[derive(Debug, Deserialize)]
struct NetworkArtifact {
    layers: Vec<LayerArtifact>,
    #[serde(default)]
    classes: Option<Vec<usize>>,
}

#[derive(Debug, Clone)]
struct DenseLayer {
    weights: Array2<f32>,
    bias: Array1<f32>,
    activation: Activation,
}

/// Multi-layer perceptron
#[derive(Debug, Clone)]
pub struct DenseNetwork {
    layers: Vec<DenseLayer>,
    classes: Vec<usize>,
}

impl DenseNetwork {
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let text = std::fs::read_to_string(path).map_err(|source| ModelError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let network = Self::parse(&text, path)?;
        info!(
            path = %path.display(),
            layers = network.layers.len(),
            "Loaded dense network"
        );
        Ok(network)
    }

    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        Self::parse(json, Path::new("<inline>"))
    }

    fn parse(text: &str, path: &Path) -> Result<Self, ModelError> {
        let artifact: NetworkArtifact =
            serde_json::from_str(text).map_err(|e| ModelError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        let layers = artifact
            .layers
            .into_iter()
            .enumerate()
            .map(|(i, layer)| build_layer(i, layer))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(layers, artifact.classes)
    }

    /// Build from `(weights [n_in, n_out], bias, activation)` triples
    pub fn new(
        layers: Vec<(Array2<f32>, Array1<f32>, Activation)>,
        classes: Option<Vec<usize>>,
    ) -> Result<Self, ModelError> {
        if layers.is_empty() {
            return Err(ModelError::Shape("network has no layers".to_string()));
        }

        let mut width = FEATURE_COUNT;
        let mut built = Vec::with_capacity(layers.len());
        for (i, (weights, bias, activation)) in layers.into_iter().enumerate() {
            let (n_in, n_out) = weights.dim();
            if n_in != width {
                return Err(ModelError::Shape(format!(
                    "layer {} expects {} inputs, previous width is {}",
                    i, n_in, width
                )));
            }
            if bias.len() != n_out {
                return Err(ModelError::Shape(format!(
                    "layer {} has {} outputs but {} biases",
                    i,
                    n_out,
                    bias.len()
                )));
            }
            width = n_out;
            built.push(DenseLayer {
                weights,
                bias,
                activation,
            });
        }

        if width != GENRE_COUNT {
            return Err(ModelError::Shape(format!(
                "network produces {} outputs, expected {}",
                width, GENRE_COUNT
            )));
        }

        let classes = classes.unwrap_or_else(|| (0..GENRE_COUNT).collect());
        if classes.len() != GENRE_COUNT {
            return Err(ModelError::Shape(format!(
                "network lists {} classes, expected {}",
                classes.len(),
                GENRE_COUNT
            )));
        }

        Ok(Self {
            layers: built,
            classes,
        })
    }

    /// Forward pass for one input row
    pub fn forward(&self, input: &[f32]) -> Result<Vec<f32>, ModelError> {
        if input.len() != FEATURE_COUNT {
            return Err(ModelError::Shape(format!(
                "input has {} values, expected {}",
                input.len(),
                FEATURE_COUNT
            )));
        }

        let mut x = Array1::from_vec(input.to_vec());
        for layer in &self.layers {
            let mut next = x.dot(&layer.weights) + &layer.bias;
            layer.activation.apply(&mut next);
            x = next;
        }
        Ok(x.to_vec())
    }
}

impl ScorePredictor for DenseNetwork {
    fn predict_scores(&self, features: &[f32]) -> Result<Vec<f32>, ModelError> {
        self.forward(features)
    }
}

impl ClassPredictor for DenseNetwork {
    fn predict_class(&self, features: &[f32]) -> Result<usize, ModelError> {
        let scores = self.forward(features)?;
        let position = argmax(&scores).ok_or(ModelError::NoFiniteScores)?;
        Ok(self.classes[position])
    }
}

fn build_layer(
    index: usize,
    layer: LayerArtifact,
) -> Result<(Array2<f32>, Array1<f32>, Activation), ModelError> {
    let n_in = layer.weights.len();
    let n_out = layer.weights.first().map(Vec::len).unwrap_or(0);
    if layer.weights.iter().any(|row| row.len() != n_out) {
        return Err(ModelError::Shape(format!(
            "layer {} weight rows have unequal lengths",
            index
        )));
    }

    let flat: Vec<f32> = layer.weights.into_iter().flatten().collect();
    let weights = Array2::from_shape_vec((n_in, n_out), flat)
        .map_err(|e| ModelError::Shape(format!("layer {}: {}", index, e)))?;
    Ok((weights, Array1::from_vec(layer.bias), layer.activation))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Single softmax layer whose weights route input column `i` to class `i`
    fn routing_network(classes: Option<Vec<usize>>) -> DenseNetwork {
        let mut weights = Array2::<f32>::zeros((FEATURE_COUNT, GENRE_COUNT));
        for k in 0..GENRE_COUNT {
            weights[[k, k]] = 1.0;
        }
        DenseNetwork::new(
            vec![(weights, Array1::zeros(GENRE_COUNT), Activation::Softmax)],
            classes,
        )
        .unwrap()
    }

    fn one_hot(k: usize) -> Vec<f32> {
        let mut x = vec![0.0; FEATURE_COUNT];
        x[k] = 5.0;
        x
    }

    #[test]
    fn test_softmax_output_sums_to_one() {
        let net = routing_network(None);
        let scores = net.predict_scores(&one_hot(2)).unwrap();
        assert_eq!(scores.len(), 10);
        assert!((scores.iter().sum::<f32>() - 1.0).abs() < 1e-5);
        assert_eq!(argmax(&scores), Some(2));
    }

    #[test]
    fn test_class_prediction_uses_class_map() {
        let net = routing_network(None);
        assert_eq!(net.predict_class(&one_hot(7)).unwrap(), 7);

        let reversed = routing_network(Some((0..10).rev().collect()));
        assert_eq!(reversed.predict_class(&one_hot(7)).unwrap(), 2);
    }

    #[test]
    fn test_hidden_layer_chain() {
        let hidden = Array2::from_elem((FEATURE_COUNT, 4), 0.1f32);
        let output = Array2::from_elem((4, GENRE_COUNT), 1.0f32);
        let net = DenseNetwork::new(
            vec![
                (hidden, Array1::zeros(4), Activation::Relu),
                (output, Array1::zeros(GENRE_COUNT), Activation::Identity),
            ],
            None,
        )
        .unwrap();

        let scores = net.forward(&vec![1.0; FEATURE_COUNT]).unwrap();
        // Each hidden unit: 57 * 0.1; each output: 4 * 5.7
        assert!((scores[0] - 22.8).abs() < 1e-3);
    }

    #[test]
    fn test_rejects_mismatched_shapes() {
        let wrong_input = Array2::<f32>::zeros((56, GENRE_COUNT));
        assert!(DenseNetwork::new(
            vec![(wrong_input, Array1::zeros(GENRE_COUNT), Activation::Identity)],
            None
        )
        .is_err());

        let wrong_output = Array2::<f32>::zeros((FEATURE_COUNT, 9));
        assert!(DenseNetwork::new(
            vec![(wrong_output, Array1::zeros(9), Activation::Identity)],
            None
        )
        .is_err());

        let wrong_bias = Array2::<f32>::zeros((FEATURE_COUNT, GENRE_COUNT));
        assert!(DenseNetwork::new(
            vec![(wrong_bias, Array1::zeros(3), Activation::Identity)],
            None
        )
        .is_err());
    }

    #[test]
    fn test_rejects_wrong_input_width() {
        let net = routing_network(None);
        assert!(matches!(net.forward(&[0.0; 10]), Err(ModelError::Shape(_))));
    }

    #[test]
    fn test_parse_json_artifact() {
        let mut weights = vec![vec![0.0f32; GENRE_COUNT]; FEATURE_COUNT];
        weights[0][3] = 1.0;
        let json = json!({
            "layers": [
                {"weights": weights, "bias": vec![0.0; GENRE_COUNT], "activation": "logistic"}
            ]
        })
        .to_string();

        let net = DenseNetwork::from_json(&json).unwrap();
        assert_eq!(net.predict_class(&one_hot(0)).unwrap(), 3);
    }

    #[test]
    fn test_parse_rejects_ragged_weights() {
        let mut weights = vec![vec![0.0f32; GENRE_COUNT]; FEATURE_COUNT];
        weights[5].pop();
        let json = json!({
            "layers": [{"weights": weights, "bias": vec![0.0; GENRE_COUNT]}]
        })
        .to_string();
        assert!(matches!(
            DenseNetwork::from_json(&json),
            Err(ModelError::Shape(_))
        ));
    }
}
