//! mgc-predict library interface
//!
//! Exposes the feature pipeline, model loading and the HTTP router so the
//! binaries and integration tests share one implementation.

pub mod api;
pub mod audio;
pub mod config;
pub mod error;
pub mod features;
pub mod inference;
pub mod models;

pub use crate::error::{PredictError, PredictResult};
pub use crate::inference::{GenrePrediction, GenrePredictor};

use axum::extract::DefaultBodyLimit;
use axum::Router;
use chrono::{DateTime, Utc};
use crate::config::ServiceLimits;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Scaler and both classifiers, read-only after startup
    pub predictor: Arc<GenrePredictor>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    pub limits: ServiceLimits,
}

impl AppState {
    pub fn new(predictor: GenrePredictor, limits: ServiceLimits) -> Self {
        Self {
            predictor: Arc::new(predictor),
            startup_time: Utc::now(),
            limits,
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.limits.max_upload_bytes;

    Router::new()
        .merge(api::root_routes())
        .merge(api::predict_routes())
        .merge(api::health_routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
