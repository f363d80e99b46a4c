//! Shared API types

pub mod types;
