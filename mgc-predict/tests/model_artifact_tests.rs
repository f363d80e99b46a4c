//! Model Artifact Loading Tests
//! Test File: model_artifact_tests.rs

mod helpers;

use helpers::{generate_wav_bytes, write_model_artifacts, AudioConfig};
use mgc_predict::config::ModelPaths;
use mgc_predict::error::{ModelError, PredictError};
use mgc_predict::models::Genre;
use mgc_predict::GenrePredictor;
use serde_json::json;

/// TC-MODEL-001: Artifacts on disk drive a full prediction
#[test]
fn tc_model_001_predict_with_json_artifacts() {
    // Given: Scaler and both networks favouring class 5 (jazz)
    let dir = tempfile::tempdir().unwrap();
    let paths = write_model_artifacts(dir.path(), 5).unwrap();

    // When: Loading and predicting a clip
    let predictor = GenrePredictor::from_config(&paths).unwrap();
    let wav = generate_wav_bytes(&AudioConfig::default()).unwrap();
    let prediction = predictor.predict(&wav).unwrap();

    // Then: Both models report jazz
    assert_eq!(prediction.mlp, Genre::Jazz);
    assert_eq!(prediction.cnn, Genre::Jazz);
}

/// TC-MODEL-002: A missing artifact aborts loading
#[test]
fn tc_model_002_missing_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let paths = ModelPaths {
        mlp: dir.path().join("absent.json"),
        ..write_model_artifacts(dir.path(), 0).unwrap()
    };

    let err = GenrePredictor::from_config(&paths).err().unwrap();
    assert!(matches!(err, PredictError::Model(ModelError::Read { .. })));
}

/// TC-MODEL-003: A scaler of the wrong width is rejected at load
#[test]
fn tc_model_003_scaler_dimension_mismatch() {
    let dir = tempfile::tempdir().unwrap();
    let paths = write_model_artifacts(dir.path(), 0).unwrap();
    std::fs::write(
        &paths.scaler,
        json!({"kind": "standard", "mean": vec![0.0; 40], "scale": vec![1.0; 40]}).to_string(),
    )
    .unwrap();

    let err = GenrePredictor::from_config(&paths).err().unwrap();
    assert!(matches!(err, PredictError::Model(ModelError::Shape(_))));
}

/// TC-MODEL-004: A network with the wrong output width is rejected at load
#[test]
fn tc_model_004_network_output_mismatch() {
    let dir = tempfile::tempdir().unwrap();
    let paths = write_model_artifacts(dir.path(), 0).unwrap();
    std::fs::write(
        &paths.cnn,
        json!({
            "layers": [{"weights": vec![vec![0.0; 8]; 57], "bias": vec![0.0; 8]}]
        })
        .to_string(),
    )
    .unwrap();

    let err = GenrePredictor::from_config(&paths).err().unwrap();
    assert!(matches!(err, PredictError::Model(ModelError::Shape(_))));
}

/// TC-MODEL-005: Malformed JSON is a parse error naming the file
#[test]
fn tc_model_005_malformed_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let paths = write_model_artifacts(dir.path(), 0).unwrap();
    std::fs::write(&paths.mlp, "{ not json").unwrap();

    let err = GenrePredictor::from_config(&paths).err().unwrap();
    let message = err.to_string();
    assert!(message.contains("mlp_model.json"), "{}", message);
}

/// TC-MODEL-006: Unknown artifact extensions are refused
#[test]
fn tc_model_006_unsupported_extension() {
    let dir = tempfile::tempdir().unwrap();
    let paths = ModelPaths {
        cnn: dir.path().join("cnn_model.keras"),
        ..write_model_artifacts(dir.path(), 0).unwrap()
    };

    let err = GenrePredictor::from_config(&paths).err().unwrap();
    assert!(matches!(
        err,
        PredictError::Model(ModelError::UnsupportedFormat(_))
    ));
}
