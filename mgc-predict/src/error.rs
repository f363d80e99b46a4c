//! Error types for mgc-predict
//!
//! Each pipeline stage has its own error enum; `PredictError` is the single
//! fallible result of a prediction and is what the HTTP layer turns into a
//! failure envelope.

use std::path::PathBuf;
use thiserror::Error;

/// Audio decoding and resampling errors
#[derive(Debug, Error)]
pub enum AudioError {
    /// Input bytes are not a recognised container/codec
    #[error("Unsupported or unreadable audio format: {0}")]
    Probe(String),

    #[error("No audio track found in input")]
    NoTrack,

    #[error("Sample rate unknown")]
    UnknownSampleRate,

    /// Decoder construction or packet decode failure
    #[error("Audio decode error: {0}")]
    Decode(String),

    /// Stream decoded but produced no samples
    #[error("No audio samples decoded")]
    Empty,

    #[error("Resampling failed: {0}")]
    Resample(String),
}

/// Feature extraction errors
#[derive(Debug, Error)]
pub enum FeatureError {
    /// Waveform shorter than the longest analysis window
    #[error("Audio too short for feature extraction: {samples} samples (minimum {minimum})")]
    TooShort { samples: usize, minimum: usize },

    /// A computed feature is NaN or infinite
    #[error("Feature '{0}' is not finite")]
    NonFinite(&'static str),

    /// Vector length or column order does not match the schema
    #[error("Feature schema mismatch: {0}")]
    Schema(String),
}

/// Model artifact loading and inference errors
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Failed to read model artifact {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse model artifact {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Unsupported model format: {0}")]
    UnsupportedFormat(String),

    /// Artifact dimensions do not match the feature schema or label set
    #[error("Model shape error: {0}")]
    Shape(String),

    #[error("Predicted class index {0} is outside the genre enumeration")]
    ClassIndexOutOfRange(usize),

    #[error("Expected {expected} class scores, got {actual}")]
    ScoreCount { expected: usize, actual: usize },

    #[error("Model produced no usable scores")]
    NoFiniteScores,

    #[error("Inference failed: {0}")]
    Inference(String),
}

/// Error for a complete prediction
#[derive(Debug, Error)]
pub enum PredictError {
    #[error(transparent)]
    Audio(#[from] AudioError),

    #[error(transparent)]
    Feature(#[from] FeatureError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("prediction timed out after {0}s")]
    Timeout(u64),

    /// The blocking worker panicked or was cancelled
    #[error("prediction task failed: {0}")]
    TaskFailed(String),
}

/// Result type for the prediction pipeline
pub type PredictResult<T> = Result<T, PredictError>;
