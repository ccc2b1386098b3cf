//! Domain models for the Crop Stress Monitoring Platform
//!
//! Re-exports models from the shared crate

pub use shared::models::*;
