//! Regression tree used as the base learner of the valuation forest

use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::errors::{DomainError, DomainResult};

/// Decision tree node. Children are indices into the tree's node list and
/// always come after their parent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    Leaf {
        value: f64,
        n_samples: usize,
    },
    Split {
        feature: usize,
        /// Values <= threshold go left
        threshold: f64,
        left: usize,
        right: usize,
        n_samples: usize,
    },
}

/// Fully grown MSE tree: every feature is examined at every split and
/// nodes split until pure or down to a single sample.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DecisionTreeRegressor {
    nodes: Vec<TreeNode>,
    n_features: usize,
    feature_importances: Vec<f64>,
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

impl DecisionTreeRegressor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unnormalised MSE reduction per feature.
    pub fn raw_importances(&self) -> &[f64] {
        &self.feature_importances
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> DomainResult<()> {
        let n_samples = x.nrows();
        if n_samples != y.len() {
            return Err(DomainError::InvalidParameter(format!(
                "x has {} rows but y has {} values",
                n_samples,
                y.len()
            )));
        }
        if n_samples == 0 {
            return Err(DomainError::InsufficientData {
                required: 1,
                actual: 0,
            });
        }

        self.n_features = x.ncols();
        let mut importances = vec![0.0; self.n_features];
        let indices: Vec<usize> = (0..n_samples).collect();
        let mut nodes = Vec::new();
        Self::build(x, y, &indices, &mut nodes, &mut importances);
        self.nodes = nodes;
        self.feature_importances = importances;
        Ok(())
    }

    pub fn predict_row(&self, sample: ArrayView1<'_, f64>) -> DomainResult<f64> {
        if self.nodes.is_empty() {
            return Err(DomainError::ModelNotFitted);
        }
        if sample.len() != self.n_features {
            return Err(DomainError::SchemaMismatch(format!(
                "expected {} features, got {}",
                self.n_features,
                sample.len()
            )));
        }

        let mut idx = 0;
        loop {
            let next = match self.nodes.get(idx) {
                Some(TreeNode::Leaf { value, .. }) => return Ok(*value),
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                }) => {
                    let value = sample.get(*feature).copied().unwrap_or(f64::NAN);
                    if value <= *threshold {
                        *left
                    } else {
                        *right
                    }
                }
                None => idx,
            };
            if next <= idx {
                return Err(DomainError::InvalidParameter(format!(
                    "corrupt tree: node {idx} points to {next}"
                )));
            }
            idx = next;
        }
    }

    /// Appends the subtree for `indices` to `nodes` and returns its index.
    fn build(
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        nodes: &mut Vec<TreeNode>,
        importances: &mut [f64],
    ) -> usize {
        let node_idx = nodes.len();
        let n_samples = indices.len();
        let (sum, sq_sum) = sums(y, indices);
        let value = sum / n_samples as f64;
        let impurity = sq_sum / n_samples as f64 - value * value;
        nodes.push(TreeNode::Leaf { value, n_samples });

        if n_samples < 2 || impurity <= 1e-12 * (value * value).max(1.0) {
            return node_idx;
        }

        let Some(split) = Self::find_best_split(x, y, indices, impurity) else {
            return node_idx;
        };

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| x[[i, split.feature]] <= split.threshold);
        if left_indices.is_empty() || right_indices.is_empty() {
            return node_idx;
        }
        importances[split.feature] += n_samples as f64 * split.gain;

        let left = Self::build(x, y, &left_indices, nodes, importances);
        let right = Self::build(x, y, &right_indices, nodes, importances);
        nodes[node_idx] = TreeNode::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
            n_samples,
        };
        node_idx
    }

    /// Sorted sweep per feature using running sums.
    fn find_best_split(
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        parent_impurity: f64,
    ) -> Option<SplitCandidate> {
        let n = indices.len() as f64;
        let (total_sum, total_sq) = sums(y, indices);
        let mut best: Option<SplitCandidate> = None;

        for feature in 0..x.ncols() {
            let mut order: Vec<usize> = indices.to_vec();
            order.sort_by(|&a, &b| x[[a, feature]].total_cmp(&x[[b, feature]]));

            let mut left_sum = 0.0;
            let mut left_sq = 0.0;
            for pos in 0..order.len() - 1 {
                let yi = y[order[pos]];
                left_sum += yi;
                left_sq += yi * yi;

                let current = x[[order[pos], feature]];
                let next = x[[order[pos + 1], feature]];
                if next <= current {
                    continue;
                }
                let left_count = pos + 1;
                let right_count = order.len() - left_count;

                let right_sum = total_sum - left_sum;
                let right_sq = total_sq - left_sq;
                let left_sse = left_sq - left_sum * left_sum / left_count as f64;
                let right_sse = right_sq - right_sum * right_sum / right_count as f64;
                let gain = parent_impurity - (left_sse + right_sse) / n;

                if gain > best.as_ref().map_or(0.0, |b| b.gain) {
                    best = Some(SplitCandidate {
                        feature,
                        threshold: (current + next) / 2.0,
                        gain,
                    });
                }
            }
        }
        best
    }
}

fn sums(y: &Array1<f64>, indices: &[usize]) -> (f64, f64) {
    indices.iter().fold((0.0, 0.0), |(sum, sq), &i| (sum + y[i], sq + y[i] * y[i]))
}
