//! # MGC Common Library
//!
//! Shared code for the music genre classifier services:
//! - Uniform JSON response envelope
//! - Common error type
//! - TOML bootstrap configuration helpers

pub mod api;
pub mod config;
pub mod error;

pub use api::types::ApiEnvelope;
pub use error::{Error, Result};
