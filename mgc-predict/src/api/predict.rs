//! Genre prediction endpoint
//!
//! `POST /predict-genre` with a multipart form field named `audio`.

use axum::body::Bytes;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{Multipart, State};
use axum::routing::post;
use axum::Router;
use mgc_common::ApiEnvelope;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, info_span, Instrument};
use uuid::Uuid;

use crate::error::PredictError;
use crate::inference::{GenrePrediction, GenrePredictor};
use crate::AppState;

/// Form field carrying the upload
pub const AUDIO_FIELD: &str = "audio";

pub const NO_AUDIO_FILE: &str = "No audio file";

/// Success payload: `{"genre": {"mlp": ..., "cnn": ...}}`
#[derive(Debug, Clone, Serialize)]
pub struct PredictData {
    pub genre: GenrePrediction,
}

/// POST /predict-genre
///
/// A request without an `audio` file part (or without a multipart body at all)
/// is answered with "No audio file" before any decoding happens. Any failure
/// after that is logged and reported as "Error processing audio: <cause>".
pub async fn predict_genre(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiEnvelope<PredictData> {
    let request_id = Uuid::new_v4();
    let span = info_span!("predict_genre", %request_id);

    async move {
        let Ok(mut multipart) = multipart else {
            debug!("Request is not multipart");
            return ApiEnvelope::failure(NO_AUDIO_FILE);
        };

        let bytes = match read_audio_field(&mut multipart).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return ApiEnvelope::failure(NO_AUDIO_FILE),
            Err(e) => return processing_failure(&e),
        };
        info!(bytes = bytes.len(), "Received audio upload");

        match run_prediction(
            Arc::clone(&state.predictor),
            bytes,
            state.limits.request_timeout,
        )
        .await
        {
            Ok(genre) => {
                info!(mlp = %genre.mlp, cnn = %genre.cnn, "Prediction complete");
                ApiEnvelope::ok(PredictData { genre })
            }
            Err(e) => processing_failure(&e),
        }
    }
    .instrument(span)
    .await
}

pub fn predict_routes() -> Router<AppState> {
    Router::new().route("/predict-genre", post(predict_genre))
}

/// First file part named `audio`; other fields and plain text parts are skipped
async fn read_audio_field(multipart: &mut Multipart) -> Result<Option<Bytes>, MultipartError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(AUDIO_FIELD) && field.file_name().is_some() {
            return field.bytes().await.map(Some);
        }
    }
    Ok(None)
}

/// Run the CPU-bound pipeline off the async workers
///
/// On timeout the worker is left to finish in the background; its result is
/// discarded.
async fn run_prediction(
    predictor: Arc<GenrePredictor>,
    bytes: Bytes,
    timeout: Option<Duration>,
) -> Result<GenrePrediction, PredictError> {
    let task = tokio::task::spawn_blocking(move || predictor.predict(&bytes));

    let joined = match timeout {
        Some(limit) => tokio::time::timeout(limit, task)
            .await
            .map_err(|_| PredictError::Timeout(limit.as_secs()))?,
        None => task.await,
    };

    joined.map_err(|e| PredictError::TaskFailed(e.to_string()))?
}

fn processing_failure(err: &dyn std::fmt::Display) -> ApiEnvelope<PredictData> {
    let message = format!("Error processing audio: {}", err);
    error!("{}", message);
    ApiEnvelope::failure(message)
}
