//! Dual-model genre prediction
//!
//! One uploaded clip goes through decode, feature extraction and scaling
//! once; the scaled vector is then fed to both classifiers independently.

use crate::audio::load_waveform;
use crate::config::ModelPaths;
use crate::error::{PredictError, PredictResult};
use crate::features::{FeatureExtractor, FeatureVector};
use crate::models::{
    decode_class_index, decode_scores, load_class_predictor, load_score_predictor,
    ClassPredictor, FeatureScaler, Genre, ScorePredictor,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Labels from both classifiers for one clip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GenrePrediction {
    /// Shallow classifier (class index output)
    pub mlp: Genre,
    /// Deep classifier (per-class score output)
    pub cnn: Genre,
}

/// Read-only bundle of scaler, extractor and both models
#[derive(Clone)]
pub struct GenrePredictor {
    extractor: Arc<FeatureExtractor>,
    scaler: Arc<FeatureScaler>,
    mlp: Arc<dyn ClassPredictor>,
    cnn: Arc<dyn ScorePredictor>,
}

impl GenrePredictor {
    pub fn new(
        scaler: FeatureScaler,
        mlp: Arc<dyn ClassPredictor>,
        cnn: Arc<dyn ScorePredictor>,
    ) -> Self {
        Self {
            extractor: Arc::new(FeatureExtractor::default()),
            scaler: Arc::new(scaler),
            mlp,
            cnn,
        }
    }

    /// Load all three artifacts; any failure aborts startup
    pub fn from_config(paths: &ModelPaths) -> PredictResult<Self> {
        let scaler = FeatureScaler::load(&paths.scaler)?;
        let mlp = load_class_predictor(&paths.mlp)?;
        let cnn = load_score_predictor(&paths.cnn)?;
        info!(
            mlp = %paths.mlp.display(),
            cnn = %paths.cnn.display(),
            scaler = %paths.scaler.display(),
            "Model artifacts loaded"
        );
        Ok(Self::new(scaler, mlp, cnn))
    }

    /// Decode and extract the unscaled features of an upload
    pub fn extract(&self, bytes: &[u8]) -> PredictResult<FeatureVector> {
        let waveform = load_waveform(bytes)?;
        Ok(self.extractor.extract(&waveform)?)
    }

    /// Decode, extract and scale an upload
    pub fn extract_scaled_features(&self, bytes: &[u8]) -> PredictResult<Vec<f32>> {
        let features = self.extract(bytes)?;
        Ok(self.scaler.transform(&features)?)
    }

    /// Run both classifiers on an already-scaled vector
    pub fn classify(&self, scaled: &[f32]) -> PredictResult<GenrePrediction> {
        let mlp_index = self.mlp.predict_class(scaled)?;
        let mlp = decode_class_index(mlp_index)?;

        let scores = self.cnn.predict_scores(scaled)?;
        let cnn = decode_scores(&scores)?;

        debug!(mlp = %mlp, cnn = %cnn, "Classified clip");
        Ok(GenrePrediction { mlp, cnn })
    }

    /// Full pipeline for one upload
    pub fn predict(&self, bytes: &[u8]) -> Result<GenrePrediction, PredictError> {
        let scaled = self.extract_scaled_features(bytes)?;
        self.classify(&scaled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;
    use crate::features::FEATURE_COUNT;

    struct FixedClass(usize);

    impl ClassPredictor for FixedClass {
        fn predict_class(&self, _: &[f32]) -> Result<usize, ModelError> {
            Ok(self.0)
        }
    }

    struct FixedScores(Vec<f32>);

    impl ScorePredictor for FixedScores {
        fn predict_scores(&self, _: &[f32]) -> Result<Vec<f32>, ModelError> {
            Ok(self.0.clone())
        }
    }

    fn predictor(class: usize, scores: Vec<f32>) -> GenrePredictor {
        GenrePredictor::new(
            FeatureScaler::identity(),
            Arc::new(FixedClass(class)),
            Arc::new(FixedScores(scores)),
        )
    }

    #[test]
    fn test_classify_decodes_both_models() {
        let mut scores = vec![0.05; 10];
        scores[9] = 0.55;
        let prediction = predictor(4, scores)
            .classify(&[0.0; FEATURE_COUNT])
            .unwrap();
        assert_eq!(prediction.mlp, Genre::HipHop);
        assert_eq!(prediction.cnn, Genre::Rock);
    }

    #[test]
    fn test_out_of_range_class_is_model_error() {
        let err = predictor(12, vec![0.1; 10])
            .classify(&[0.0; FEATURE_COUNT])
            .unwrap_err();
        assert!(matches!(
            err,
            PredictError::Model(ModelError::ClassIndexOutOfRange(12))
        ));
    }

    #[test]
    fn test_wrong_score_count_is_model_error() {
        let err = predictor(0, vec![0.1; 3])
            .classify(&[0.0; FEATURE_COUNT])
            .unwrap_err();
        assert!(matches!(err, PredictError::Model(ModelError::ScoreCount { .. })));
    }

    #[test]
    fn test_undecodable_upload_is_audio_error() {
        let err = predictor(0, vec![0.1; 10]).predict(b"not audio").unwrap_err();
        assert!(matches!(err, PredictError::Audio(_)));
    }

    #[test]
    fn test_prediction_serializes_labels() {
        let prediction = GenrePrediction {
            mlp: Genre::Jazz,
            cnn: Genre::Metal,
        };
        assert_eq!(
            serde_json::to_value(prediction).unwrap(),
            serde_json::json!({"mlp": "jazz", "cnn": "metal"})
        );
    }
}
