//! HTTP API handlers for mgc-predict
//!
//! Every route answers with the `ApiEnvelope` JSON shape and HTTP 200;
//! failures are reported through `success: false`.

pub mod health;
pub mod predict;
pub mod root;

pub use health::health_routes;
pub use predict::predict_routes;
pub use root::root_routes;
