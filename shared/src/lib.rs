//! Shared types and domain logic for the Crop Stress Monitoring Platform
//!
//! This crate contains the pure, synchronous core of the system: observation
//! models, temporal feature derivation, percentile-adaptive stress labeling,
//! and the single-point feature approximation used at inference time. It
//! performs no I/O and holds no shared state; the backend crate drives it.

pub mod features;
pub mod labeling;
pub mod models;
pub mod validation;

pub use features::*;
pub use labeling::*;
pub use models::*;
pub use validation::*;
