//! HTTP handlers for the Crop Stress Monitoring Platform

pub mod analysis;
pub mod health;
pub mod observations;
pub mod predictions;
pub mod training;

pub use analysis::*;
pub use health::*;
pub use observations::*;
pub use predictions::*;
pub use training::*;
