//! In-process water-stress classifier
//!
//! A gini-based CART random forest with a z-score feature scaler. The
//! trained bundle (forest + scaler + ordered feature-name list) is the
//! artifact the feature pipeline must match column-for-column.

pub mod artifact;
pub mod forest;
pub mod scaler;
pub mod tree;

pub use artifact::{
    ClassReport, FeatureImportance, StressModel, StressPrediction, TrainingMetrics,
};
pub use forest::{ForestParams, RandomForest, RfPrediction};
pub use scaler::StandardScaler;
pub use tree::{DecisionTree, TreeParams};

use shared::SchemaError;
use thiserror::Error;

/// Errors from model training, inference, and artifact persistence.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("empty training set")]
    EmptyTrainingSet,

    #[error("feature dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("label {label} is out of range for {n_classes} classes")]
    InvalidLabel { label: usize, n_classes: usize },

    #[error("invalid artifact: {0}")]
    InvalidArtifact(String),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("artifact I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("artifact serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
