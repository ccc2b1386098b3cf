//! Z-score feature scaling

use serde::{Deserialize, Serialize};

use super::ModelError;

/// Standardizes features to zero mean and unit variance.
///
/// Fitted on the training split only; the same fitted parameters transform
/// evaluation and serving vectors. Population standard deviation is used.
/// A zero-variance feature keeps a scale factor of 1 so it maps to 0 rather
/// than dividing by zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub means: Vec<f64>,
    pub stds: Vec<f64>,
}

impl StandardScaler {
    /// Fit means and standard deviations from a training matrix.
    pub fn fit(rows: &[Vec<f64>]) -> Result<Self, ModelError> {
        let n_rows = rows.len();
        if n_rows == 0 {
            return Err(ModelError::EmptyTrainingSet);
        }
        let n_features = rows[0].len();
        for row in rows {
            if row.len() != n_features {
                return Err(ModelError::DimensionMismatch {
                    expected: n_features,
                    got: row.len(),
                });
            }
        }

        let mut means = vec![0.0; n_features];
        for row in rows {
            for (m, v) in means.iter_mut().zip(row) {
                *m += v;
            }
        }
        for m in &mut means {
            *m /= n_rows as f64;
        }

        let mut stds = vec![0.0; n_features];
        for row in rows {
            for ((s, v), m) in stds.iter_mut().zip(row).zip(&means) {
                *s += (v - m) * (v - m);
            }
        }
        for s in &mut stds {
            *s = (*s / n_rows as f64).sqrt();
            if *s == 0.0 {
                *s = 1.0;
            }
        }

        Ok(Self { means, stds })
    }

    /// Number of features this scaler was fitted on.
    pub fn n_features(&self) -> usize {
        self.means.len()
    }

    /// Scale a single vector.
    pub fn transform_row(&self, row: &[f64]) -> Result<Vec<f64>, ModelError> {
        if row.len() != self.means.len() {
            return Err(ModelError::DimensionMismatch {
                expected: self.means.len(),
                got: row.len(),
            });
        }
        Ok(row
            .iter()
            .zip(self.means.iter().zip(&self.stds))
            .map(|(v, (m, s))| (v - m) / s)
            .collect())
    }

    /// Scale a matrix row by row.
    pub fn transform(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ModelError> {
        rows.iter().map(|r| self.transform_row(r)).collect()
    }
}
