//! Gini-based CART decision tree
//!
//! Array-based tree representation: nodes live in a flat vector and splits
//! reference children by index, so traversal is a simple loop and the whole
//! tree serializes naturally. Leaves store the class distribution of the
//! training samples that reached them, which gives probability estimates for
//! free.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::ModelError;

/// Tree growth parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeParams {
    /// Maximum depth (root is depth 0)
    pub max_depth: usize,
    /// Minimum samples a node needs to be considered for splitting
    pub min_samples_split: usize,
    /// Number of features examined per split; `None` examines all
    pub max_features: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Node {
    Leaf {
        /// Class probabilities among training samples at this leaf
        distribution: Vec<f64>,
    },
    Split {
        feature: usize,
        /// Samples with value <= threshold go left
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// A trained decision tree classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
    n_features: usize,
    n_classes: usize,
    /// Normalized impurity-decrease importance per feature
    importances: Vec<f64>,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    decrease: f64,
}

struct TreeBuilder<'a> {
    samples: &'a [Vec<f64>],
    labels: &'a [usize],
    n_features: usize,
    n_classes: usize,
    params: TreeParams,
    total: usize,
    nodes: Vec<Node>,
    importances: Vec<f64>,
}

impl DecisionTree {
    /// Train a tree on a sample matrix and class labels.
    ///
    /// `rng` drives the per-split feature subsampling; with
    /// `max_features: None` the rng is never consulted and training is fully
    /// deterministic for identical input.
    pub fn fit(
        samples: &[Vec<f64>],
        labels: &[usize],
        n_classes: usize,
        params: TreeParams,
        rng: &mut StdRng,
    ) -> Result<Self, ModelError> {
        if samples.is_empty() || samples.len() != labels.len() {
            return Err(ModelError::EmptyTrainingSet);
        }
        let n_features = samples[0].len();
        for row in samples {
            if row.len() != n_features {
                return Err(ModelError::DimensionMismatch {
                    expected: n_features,
                    got: row.len(),
                });
            }
        }
        for &label in labels {
            if label >= n_classes {
                return Err(ModelError::InvalidLabel { label, n_classes });
            }
        }

        let mut builder = TreeBuilder {
            samples,
            labels,
            n_features,
            n_classes,
            params,
            total: samples.len(),
            nodes: Vec::new(),
            importances: vec![0.0; n_features],
        };
        let all_indices: Vec<usize> = (0..samples.len()).collect();
        builder.grow(all_indices, 0, rng);

        let mut importances = builder.importances;
        let sum: f64 = importances.iter().sum();
        if sum > 0.0 {
            for imp in &mut importances {
                *imp /= sum;
            }
        }

        Ok(Self {
            nodes: builder.nodes,
            n_features,
            n_classes,
            importances,
        })
    }

    /// Classify a single sample (argmax of the leaf distribution; ties go to
    /// the lower class).
    pub fn predict(&self, features: &[f64]) -> usize {
        argmax(self.predict_proba(features))
    }

    /// Class probabilities at the leaf this sample reaches.
    pub fn predict_proba(&self, features: &[f64]) -> &[f64] {
        let mut idx = 0usize;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { distribution } => return distribution,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let value = features.get(*feature).copied().unwrap_or(0.0);
                    idx = if value <= *threshold { *left } else { *right };
                }
            }
        }
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    /// Normalized impurity-decrease importance per feature.
    pub fn importances(&self) -> &[f64] {
        &self.importances
    }
}

impl<'a> TreeBuilder<'a> {
    /// Grow the subtree for `indices`, returning its node index.
    fn grow(&mut self, indices: Vec<usize>, depth: usize, rng: &mut StdRng) -> usize {
        let counts = self.class_counts(&indices);
        let node_gini = gini(&counts, indices.len());

        let splittable = depth < self.params.max_depth
            && indices.len() >= self.params.min_samples_split
            && node_gini > 0.0;

        if !splittable {
            return self.push_leaf(&counts, indices.len());
        }

        let Some(split) = self.best_split(&indices, node_gini, rng) else {
            return self.push_leaf(&counts, indices.len());
        };

        self.importances[split.feature] +=
            indices.len() as f64 / self.total as f64 * split.decrease;

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&i| self.samples[i][split.feature] <= split.threshold);

        // Reserve the split slot before recursing so children know nothing
        // about their parent's index.
        let slot = self.nodes.len();
        self.nodes.push(Node::Leaf {
            distribution: Vec::new(),
        });
        let left = self.grow(left_idx, depth + 1, rng);
        let right = self.grow(right_idx, depth + 1, rng);
        self.nodes[slot] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        slot
    }

    fn push_leaf(&mut self, counts: &[usize], n: usize) -> usize {
        let distribution = counts.iter().map(|&c| c as f64 / n as f64).collect();
        self.nodes.push(Node::Leaf { distribution });
        self.nodes.len() - 1
    }

    fn class_counts(&self, indices: &[usize]) -> Vec<usize> {
        let mut counts = vec![0usize; self.n_classes];
        for &i in indices {
            counts[self.labels[i]] += 1;
        }
        counts
    }

    /// Exhaustive threshold search over a feature subset.
    ///
    /// Candidate thresholds are midpoints between distinct consecutive sorted
    /// values; the split with the largest gini decrease wins, first-seen on
    /// ties so training is deterministic.
    fn best_split(&self, indices: &[usize], node_gini: f64, rng: &mut StdRng) -> Option<BestSplit> {
        let features: Vec<usize> = match self.params.max_features {
            Some(k) if k < self.n_features => {
                let all: Vec<usize> = (0..self.n_features).collect();
                let mut chosen: Vec<usize> = all.choose_multiple(rng, k).copied().collect();
                chosen.sort_unstable();
                chosen
            }
            _ => (0..self.n_features).collect(),
        };

        let n = indices.len();
        let mut best: Option<BestSplit> = None;

        for feature in features {
            let mut pairs: Vec<(f64, usize)> = indices
                .iter()
                .map(|&i| (self.samples[i][feature], self.labels[i]))
                .collect();
            pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut left_counts = vec![0usize; self.n_classes];
            let mut right_counts = self.class_counts(indices);

            for i in 1..n {
                let (prev_value, prev_label) = pairs[i - 1];
                left_counts[prev_label] += 1;
                right_counts[prev_label] -= 1;

                if pairs[i].0 <= prev_value {
                    continue;
                }

                let weighted = (i as f64 * gini(&left_counts, i)
                    + (n - i) as f64 * gini(&right_counts, n - i))
                    / n as f64;
                let decrease = node_gini - weighted;

                if decrease > 0.0 && best.as_ref().map_or(true, |b| decrease > b.decrease) {
                    best = Some(BestSplit {
                        feature,
                        threshold: (prev_value + pairs[i].0) / 2.0,
                        decrease,
                    });
                }
            }
        }

        best
    }
}

fn gini(counts: &[usize], n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let n = n as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / n;
            p * p
        })
        .sum::<f64>()
}

fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] {
            best = i;
        }
    }
    best
}
