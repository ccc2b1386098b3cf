//! Trained classifier artifact
//!
//! The persisted bundle ties together the fitted forest, the fitted scaler,
//! and the ordered feature-name list the feature pipeline must reproduce
//! exactly. A feature vector whose columns do not match the stored list is a
//! fatal error: the model has no concept of a missing feature, and a
//! reordered vector would yield plausible-looking garbage.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shared::{FeatureRow, StressLevel};

use super::forest::RandomForest;
use super::scaler::StandardScaler;
use super::ModelError;

/// One feature's share of the forest's impurity decrease.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

/// Per-class evaluation metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassReport {
    pub label: StressLevel,
    pub precision: f64,
    pub recall: f64,
    pub support: usize,
}

/// Held-out evaluation results recorded with the artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetrics {
    pub accuracy: f64,
    /// confusion[actual][predicted]
    pub confusion_matrix: Vec<Vec<usize>>,
    pub per_class: Vec<ClassReport>,
    pub train_size: usize,
    pub test_size: usize,
}

/// Result of a single stress prediction.
#[derive(Debug, Clone)]
pub struct StressPrediction {
    pub level: StressLevel,
    /// Probabilities indexed by ordinal level
    pub probabilities: [f64; 3],
    /// Probability of the predicted level
    pub confidence: f64,
}

/// The complete trained artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressModel {
    /// Ordered feature columns the model was trained on
    pub feature_names: Vec<String>,
    pub scaler: StandardScaler,
    pub forest: RandomForest,
    /// Importances sorted descending
    pub importances: Vec<FeatureImportance>,
    pub trained_at: DateTime<Utc>,
    pub metrics: TrainingMetrics,
}

impl StressModel {
    /// Predict the stress level for one feature row.
    ///
    /// The row is projected into the artifact's stored column order, scaled
    /// with the fitted scaler, and run through the forest. Any schema
    /// mismatch aborts the prediction.
    pub fn predict(&self, row: &FeatureRow) -> Result<StressPrediction, ModelError> {
        let vector = row.to_vector(&self.feature_names)?;
        let scaled = self.scaler.transform_row(&vector)?;
        let prediction = self.forest.predict_detailed(&scaled)?;

        let level = StressLevel::from_level(prediction.class as u8).ok_or_else(|| {
            ModelError::InvalidArtifact(format!(
                "forest predicted class {} outside the stress ordinal range",
                prediction.class
            ))
        })?;

        let mut probabilities = [0.0; 3];
        for (slot, p) in probabilities.iter_mut().zip(&prediction.probabilities) {
            *slot = *p;
        }

        Ok(StressPrediction {
            level,
            probabilities,
            confidence: prediction.confidence,
        })
    }

    /// Persist the artifact as JSON, creating parent directories as needed.
    pub fn save(&self, path: &str) -> Result<(), ModelError> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_vec_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load an artifact from disk, checking internal consistency.
    pub fn load(path: &str) -> Result<Self, ModelError> {
        let bytes = fs::read(path)?;
        let model: Self = serde_json::from_slice(&bytes)?;

        if model.feature_names.len() != model.forest.n_features() {
            return Err(ModelError::InvalidArtifact(format!(
                "feature list has {} names but the forest expects {}",
                model.feature_names.len(),
                model.forest.n_features()
            )));
        }
        if model.feature_names.len() != model.scaler.n_features() {
            return Err(ModelError::InvalidArtifact(format!(
                "feature list has {} names but the scaler was fitted on {}",
                model.feature_names.len(),
                model.scaler.n_features()
            )));
        }

        Ok(model)
    }
}
