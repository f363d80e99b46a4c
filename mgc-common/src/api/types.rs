//! Shared API response types
//!
//! Every HTTP response body carries a `success` discriminator:
//!
//! ```json
//! { "success": true,  "data": { ... } }
//! { "success": false, "error": "message" }
//! ```
//!
//! Clients branch on `success` before reading `data` or `error`, so the
//! key names are part of the wire contract.

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Uniform response envelope
///
/// # Examples
///
/// ```
/// use mgc_common::api::types::ApiEnvelope;
///
/// let ok = ApiEnvelope::ok(serde_json::json!({"message": "hi"}));
/// assert_eq!(
///     serde_json::to_string(&ok).unwrap(),
///     r#"{"success":true,"data":{"message":"hi"}}"#
/// );
///
/// let failed: ApiEnvelope<()> = ApiEnvelope::failure("No audio file");
/// assert_eq!(
///     serde_json::to_string(&failed).unwrap(),
///     r#"{"success":false,"error":"No audio file"}"#
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiEnvelope<T> {
    /// Success envelope wrapping `data`
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Failure envelope carrying a human-readable message
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }
}

/// Envelopes are always sent with 200 OK; business failures are signalled
/// by `success: false` only.
impl<T: Serialize> IntoResponse for ApiEnvelope<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Payload of `GET /`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageData {
    pub message: String,
}
