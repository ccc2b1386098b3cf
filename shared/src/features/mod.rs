//! Feature engineering: temporal derivation and single-point approximation

pub mod approximator;
pub mod config;
pub mod deriver;

pub use approximator::SinglePointApproximator;
pub use config::{DeficitConfig, FeatureConfig};
pub use deriver::{deficit_score, drop_incomplete_rows, FeatureError, TemporalFeatureDeriver};
