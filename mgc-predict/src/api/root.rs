//! Liveness banner

use axum::{routing::get, Router};
use mgc_common::api::types::MessageData;
use mgc_common::ApiEnvelope;

use crate::AppState;

pub const BANNER: &str = "Server running 🚀 (music-genre-classifier)";

/// GET /
pub async fn root() -> ApiEnvelope<MessageData> {
    ApiEnvelope::ok(MessageData {
        message: BANNER.to_string(),
    })
}

pub fn root_routes() -> Router<AppState> {
    Router::new().route("/", get(root))
}
