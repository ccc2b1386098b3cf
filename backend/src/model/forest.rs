//! Random forest ensemble
//!
//! Bootstrap-sampled CART trees with sqrt-feature subsampling per split.
//! Probabilities are the mean of per-tree leaf distributions, so the
//! predicted class is the argmax of averaged probabilities rather than a
//! raw vote count. All randomness flows from a single seeded generator:
//! the same data, parameters, and seed always produce the same forest.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::tree::{DecisionTree, TreeParams};
use super::ModelError;

/// Forest training parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 10,
            min_samples_split: 10,
            seed: 42,
        }
    }
}

/// A trained random-forest classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    n_features: usize,
    n_classes: usize,
    importances: Vec<f64>,
}

/// Result of forest prediction with probability details.
#[derive(Debug, Clone)]
pub struct RfPrediction {
    /// Predicted class (argmax of averaged probabilities)
    pub class: usize,
    /// Mean leaf-distribution probability per class
    pub probabilities: Vec<f64>,
    /// Probability of the winning class
    pub confidence: f64,
}

impl RandomForest {
    /// Train a forest on a sample matrix and class labels.
    pub fn fit(
        samples: &[Vec<f64>],
        labels: &[usize],
        n_classes: usize,
        params: ForestParams,
    ) -> Result<Self, ModelError> {
        if samples.is_empty() || params.n_trees == 0 {
            return Err(ModelError::EmptyTrainingSet);
        }

        let n = samples.len();
        let n_features = samples[0].len();
        let max_features = ((n_features as f64).sqrt().floor() as usize).max(1);

        let tree_params = TreeParams {
            max_depth: params.max_depth,
            min_samples_split: params.min_samples_split,
            max_features: Some(max_features),
        };

        let mut rng = StdRng::seed_from_u64(params.seed);
        let mut trees = Vec::with_capacity(params.n_trees);

        for _ in 0..params.n_trees {
            let indices: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
            let boot_samples: Vec<Vec<f64>> = indices.iter().map(|&i| samples[i].clone()).collect();
            let boot_labels: Vec<usize> = indices.iter().map(|&i| labels[i]).collect();
            trees.push(DecisionTree::fit(
                &boot_samples,
                &boot_labels,
                n_classes,
                tree_params,
                &mut rng,
            )?);
        }

        let importances = mean_importances(&trees, n_features);

        Ok(Self {
            trees,
            n_features,
            n_classes,
            importances,
        })
    }

    /// Predict a single sample with probability details.
    pub fn predict_detailed(&self, features: &[f64]) -> Result<RfPrediction, ModelError> {
        if features.len() != self.n_features {
            return Err(ModelError::DimensionMismatch {
                expected: self.n_features,
                got: features.len(),
            });
        }

        let mut probabilities = vec![0.0; self.n_classes];
        for tree in &self.trees {
            for (acc, p) in probabilities.iter_mut().zip(tree.predict_proba(features)) {
                *acc += p;
            }
        }
        for p in &mut probabilities {
            *p /= self.trees.len() as f64;
        }

        let class = probabilities
            .iter()
            .enumerate()
            .fold(0, |best, (i, &p)| if p > probabilities[best] { i } else { best });
        let confidence = probabilities[class];

        Ok(RfPrediction {
            class,
            probabilities,
            confidence,
        })
    }

    /// Predict a single sample, returning the class only.
    pub fn predict(&self, features: &[f64]) -> Result<usize, ModelError> {
        Ok(self.predict_detailed(features)?.class)
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Mean normalized impurity-decrease importance per feature.
    pub fn importances(&self) -> &[f64] {
        &self.importances
    }
}

fn mean_importances(trees: &[DecisionTree], n_features: usize) -> Vec<f64> {
    let mut mean = vec![0.0; n_features];
    for tree in trees {
        for (acc, imp) in mean.iter_mut().zip(tree.importances()) {
            *acc += imp;
        }
    }
    let sum: f64 = mean.iter().sum();
    if sum > 0.0 {
        for m in &mut mean {
            *m /= sum;
        }
    }
    mean
}
