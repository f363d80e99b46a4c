//! Test Helper Utilities
//!
//! Shared utilities for testing mgc-predict

#![allow(dead_code)]

pub mod audio_generator;
pub mod models;

pub use audio_generator::{generate_test_wav, generate_wav_bytes, AudioConfig};
pub use models::{
    peaked_scores, write_model_artifacts, CallCounter, CountingClassifier, CountingScorer, PanickingScorer,
    SlowScorer,
};
