//! Stub classifiers and on-disk model artifacts

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use mgc_predict::config::ModelPaths;
use mgc_predict::error::ModelError;
use mgc_predict::features::{FEATURE_COUNT, FEATURE_NAMES};
use mgc_predict::models::{ClassPredictor, ScorePredictor, GENRE_COUNT};
use serde_json::json;

/// Shared invocation count
#[derive(Debug, Clone, Default)]
pub struct CallCounter(Arc<AtomicUsize>);

impl CallCounter {
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    fn bump(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// Always predicts `class`, counting calls
pub struct CountingClassifier {
    pub class: usize,
    pub calls: CallCounter,
}

impl ClassPredictor for CountingClassifier {
    fn predict_class(&self, features: &[f32]) -> Result<usize, ModelError> {
        assert_eq!(features.len(), FEATURE_COUNT);
        self.calls.bump();
        Ok(self.class)
    }
}

/// Always returns `scores`, counting calls
pub struct CountingScorer {
    pub scores: Vec<f32>,
    pub calls: CallCounter,
}

impl ScorePredictor for CountingScorer {
    fn predict_scores(&self, features: &[f32]) -> Result<Vec<f32>, ModelError> {
        assert_eq!(features.len(), FEATURE_COUNT);
        self.calls.bump();
        Ok(self.scores.clone())
    }
}

/// Sleeps before answering
pub struct SlowScorer(pub Duration);

impl ScorePredictor for SlowScorer {
    fn predict_scores(&self, _: &[f32]) -> Result<Vec<f32>, ModelError> {
        std::thread::sleep(self.0);
        Ok(vec![0.1; GENRE_COUNT])
    }
}

pub struct PanickingScorer;

impl ScorePredictor for PanickingScorer {
    fn predict_scores(&self, _: &[f32]) -> Result<Vec<f32>, ModelError> {
        panic!("scorer exploded");
    }
}

/// Scores with class `winner` highest
pub fn peaked_scores(winner: usize) -> Vec<f32> {
    let mut scores = vec![0.05; GENRE_COUNT];
    scores[winner] = 0.55;
    scores
}

/// Write a standard scaler and two single-layer networks into `dir`
///
/// Both networks route all weight to `winner`'s output through the bias, so
/// any input yields that class.
pub fn write_model_artifacts(dir: &Path, winner: usize) -> anyhow::Result<ModelPaths> {
    let scaler = json!({
        "kind": "standard",
        "mean": vec![0.0; FEATURE_COUNT],
        "scale": vec![1.0; FEATURE_COUNT],
        "feature_names": FEATURE_NAMES.to_vec(),
    });

    let mut bias = vec![0.0f32; GENRE_COUNT];
    bias[winner] = 1000.0;
    let network = json!({
        "layers": [{
            "weights": vec![vec![0.0f32; GENRE_COUNT]; FEATURE_COUNT],
            "bias": bias,
            "activation": "softmax",
        }]
    });

    let paths = ModelPaths {
        mlp: dir.join("mlp_model.json"),
        cnn: dir.join("cnn_model.json"),
        scaler: dir.join("feature_scaler.json"),
    };
    std::fs::write(&paths.scaler, scaler.to_string())?;
    std::fs::write(&paths.mlp, network.to_string())?;
    std::fs::write(&paths.cnn, network.to_string())?;
    Ok(paths)
}
