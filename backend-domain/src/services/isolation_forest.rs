//! Isolation Forest anomaly detection
//!
//! Points are isolated by random axis-aligned splits; outliers sit in sparse
//! regions and reach a leaf after fewer splits. Scores follow the usual
//! convention: `score_samples` is the negated anomaly score (lower is more
//! anomalous) and the decision value subtracts an offset chosen so that the
//! `contamination` fraction of the training set falls below zero.

use ndarray::{Array1, Array2, ArrayView1};
use rand::seq::index;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::entities::AnomalyScore;
use crate::errors::{DomainError, DomainResult};

/// Fewer samples than this make the contamination threshold meaningless.
pub const MIN_FIT_SAMPLES: usize = 5;
const DEFAULT_MAX_SAMPLES: usize = 256;
const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsolationForestParams {
    pub n_estimators: usize,
    /// Samples drawn per tree; `None` means `min(256, n)`.
    pub max_samples: Option<usize>,
    pub contamination: f64,
    pub seed: u64,
}

impl Default for IsolationForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_samples: None,
            contamination: 0.2,
            seed: 42,
        }
    }
}

impl IsolationForestParams {
    pub fn validate(&self) -> DomainResult<()> {
        if self.n_estimators == 0 {
            return Err(DomainError::InvalidParameter(
                "n_estimators must be greater than 0".to_string(),
            ));
        }
        if matches!(self.max_samples, Some(0)) {
            return Err(DomainError::InvalidParameter(
                "max_samples must be greater than 0".to_string(),
            ));
        }
        if !(self.contamination > 0.0 && self.contamination <= 0.5) {
            return Err(DomainError::InvalidParameter(format!(
                "contamination must be in (0, 0.5], got {}",
                self.contamination
            )));
        }
        Ok(())
    }
}

/// Isolation tree node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum IsolationTree {
    Internal {
        feature: usize,
        threshold: f64,
        /// Values < threshold
        left: Box<IsolationTree>,
        right: Box<IsolationTree>,
    },
    External {
        size: usize,
    },
}

impl IsolationTree {
    pub fn build(
        x: &Array2<f64>,
        indices: &[usize],
        height: usize,
        max_height: usize,
        rng: &mut impl Rng,
    ) -> Self {
        let n_samples = indices.len();
        if height >= max_height || n_samples <= 1 {
            return IsolationTree::External { size: n_samples };
        }

        // Only features that still vary inside this node can split it.
        let candidates: Vec<(usize, f64, f64)> = (0..x.ncols())
            .filter_map(|feature| {
                let (min_val, max_val) = indices.iter().fold(
                    (f64::INFINITY, f64::NEG_INFINITY),
                    |(lo, hi), &i| (lo.min(x[[i, feature]]), hi.max(x[[i, feature]])),
                );
                (max_val > min_val).then_some((feature, min_val, max_val))
            })
            .collect();
        if candidates.is_empty() {
            return IsolationTree::External { size: n_samples };
        }

        let (feature, min_val, max_val) = candidates[rng.gen_range(0..candidates.len())];
        let threshold = rng.gen_range(min_val..max_val);

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) =
            indices.iter().partition(|&&i| x[[i, feature]] < threshold);
        if left_indices.is_empty() || right_indices.is_empty() {
            return IsolationTree::External { size: n_samples };
        }

        IsolationTree::Internal {
            feature,
            threshold,
            left: Box::new(Self::build(x, &left_indices, height + 1, max_height, rng)),
            right: Box::new(Self::build(x, &right_indices, height + 1, max_height, rng)),
        }
    }

    pub fn path_length(&self, sample: ArrayView1<'_, f64>, current_height: usize) -> f64 {
        match self {
            IsolationTree::External { size } => current_height as f64 + average_path_length(*size),
            IsolationTree::Internal {
                feature,
                threshold,
                left,
                right,
            } => {
                if sample[*feature] < *threshold {
                    left.path_length(sample, current_height + 1)
                } else {
                    right.path_length(sample, current_height + 1)
                }
            }
        }
    }
}

/// Average path length of an unsuccessful BST search over `n` points.
///
/// c(n) = 2 * H(n-1) - 2(n-1)/n, with H(i) ~ ln(i) + gamma.
pub fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

/// Isolation Forest detector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IsolationForest {
    params: IsolationForestParams,
    trees: Option<Vec<IsolationTree>>,
    sample_size: usize,
    n_features: usize,
    offset: f64,
}

impl IsolationForest {
    pub fn new(params: IsolationForestParams) -> DomainResult<Self> {
        params.validate()?;
        Ok(Self {
            params,
            trees: None,
            sample_size: 0,
            n_features: 0,
            offset: 0.0,
        })
    }

    pub fn params(&self) -> &IsolationForestParams {
        &self.params
    }

    pub fn is_fitted(&self) -> bool {
        self.trees.is_some()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Decision threshold on `score_samples`.
    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn fit(&mut self, x: &Array2<f64>) -> DomainResult<()> {
        let n_samples = x.nrows();
        if n_samples < MIN_FIT_SAMPLES {
            return Err(DomainError::InsufficientData {
                required: MIN_FIT_SAMPLES,
                actual: n_samples,
            });
        }
        if x.ncols() == 0 {
            return Err(DomainError::InvalidParameter(
                "feature matrix has no columns".to_string(),
            ));
        }
        ensure_finite(x)?;

        let sample_size = self
            .params
            .max_samples
            .unwrap_or(DEFAULT_MAX_SAMPLES)
            .min(n_samples);
        let max_height = (sample_size as f64).log2().ceil() as usize;
        let seed = self.params.seed;

        let trees: Vec<IsolationTree> = (0..self.params.n_estimators)
            .into_par_iter()
            .map(|tree_idx| {
                let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(tree_idx as u64));
                let indices = index::sample(&mut rng, n_samples, sample_size).into_vec();
                IsolationTree::build(x, &indices, 0, max_height, &mut rng)
            })
            .collect();

        self.trees = Some(trees);
        self.sample_size = sample_size;
        self.n_features = x.ncols();

        let scores = self.score_samples(x)?;
        self.offset = percentile(scores.to_vec(), 100.0 * self.params.contamination);
        Ok(())
    }

    /// Negated anomaly score `-2^(-E[h(x)] / c(psi))`; lower is more anomalous.
    pub fn score_samples(&self, x: &Array2<f64>) -> DomainResult<Array1<f64>> {
        let trees = self.trees.as_ref().ok_or(DomainError::ModelNotFitted)?;
        if x.ncols() != self.n_features {
            return Err(DomainError::SchemaMismatch(format!(
                "expected {} features, got {}",
                self.n_features,
                x.ncols()
            )));
        }
        ensure_finite(x)?;

        let normalizer = average_path_length(self.sample_size);
        let scores = x
            .rows()
            .into_iter()
            .map(|row| {
                let avg_path_length = trees
                    .iter()
                    .map(|tree| tree.path_length(row, 0))
                    .sum::<f64>()
                    / trees.len() as f64;
                -(2.0_f64).powf(-avg_path_length / normalizer)
            })
            .collect::<Vec<_>>();
        Ok(Array1::from_vec(scores))
    }

    /// `score_samples - offset`; negative values are anomalies.
    pub fn decision_function(&self, x: &Array2<f64>) -> DomainResult<Array1<f64>> {
        Ok(self.score_samples(x)? - self.offset)
    }

    pub fn predict(&self, x: &Array2<f64>) -> DomainResult<Vec<AnomalyScore>> {
        Ok(self
            .decision_function(x)?
            .iter()
            .map(|&score| AnomalyScore::from_decision(score))
            .collect())
    }
}

fn ensure_finite(x: &Array2<f64>) -> DomainResult<()> {
    for ((row, col), value) in x.indexed_iter() {
        if !value.is_finite() {
            return Err(DomainError::NonFinite {
                field: format!("row {row}, column {col}"),
            });
        }
    }
    Ok(())
}

/// Percentile with linear interpolation between closest ranks.
fn percentile(mut values: Vec<f64>, q: f64) -> f64 {
    values.sort_by(|a, b| a.total_cmp(b));
    let rank = (q / 100.0) * (values.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    values[lower] + (rank - lower as f64) * (values[upper] - values[lower])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{feature_matrix, AnomalyLabel, FeatureVector};

    fn reference() -> Array2<f64> {
        let rows = [
            (3000.0, 0.9, 365),
            (3200.0, 1.0, 180),
            (3100.0, 1.1, 400),
            (2900.0, 0.95, 220),
            (3050.0, 1.2, 300),
            (4500.0, 1.0, 60),
            (10000.0, 1.8, 10),
        ];
        let vectors: Vec<FeatureVector> = rows
            .iter()
            .map(|&(pps, ratio, days)| FeatureVector::new(pps, ratio, days).unwrap())
            .collect();
        feature_matrix(&vectors)
    }

    fn fitted() -> IsolationForest {
        let mut forest = IsolationForest::new(IsolationForestParams::default()).unwrap();
        forest.fit(&reference()).unwrap();
        forest
    }

    fn query(pps: f64, ratio: f64, days: i64) -> Array2<f64> {
        feature_matrix(&[FeatureVector::new(pps, ratio, days).unwrap()])
    }

    #[test]
    fn flags_extreme_transaction() {
        let forest = fitted();
        let verdict = forest.predict(&query(10000.0, 1.8, 10)).unwrap()[0];
        assert_eq!(verdict.label, AnomalyLabel::Anomalous);
        assert!(verdict.score < 0.0);
    }

    #[test]
    fn median_transaction_is_normal() {
        let forest = fitted();
        let verdict = forest.predict(&query(3100.0, 1.1, 400)).unwrap()[0];
        assert_eq!(verdict.label, AnomalyLabel::Normal);
    }

    #[test]
    fn contamination_fraction_of_reference_is_flagged() {
        let forest = fitted();
        let labels = forest.predict(&reference()).unwrap();
        let flagged: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter(|(_, score)| score.is_anomaly())
            .map(|(idx, _)| idx)
            .collect();
        assert_eq!(flagged, vec![5, 6]);
    }

    #[test]
    fn same_seed_gives_identical_scores() {
        let a = fitted();
        let b = fitted();
        let query_row = query(5200.0, 1.3, 45);
        assert_eq!(a.decision_function(&query_row).unwrap(), b.decision_function(&query_row).unwrap());
        assert_eq!(a.offset(), b.offset());
    }

    #[test]
    fn outlier_scores_lower_than_inlier() {
        let forest = fitted();
        let scores = forest.score_samples(&reference()).unwrap();
        assert!(scores[6] < scores[2]);
        assert!(scores.iter().all(|s| *s < 0.0 && *s >= -1.0));
    }

    #[test]
    fn scoring_unfitted_forest_fails() {
        let forest = IsolationForest::new(IsolationForestParams::default()).unwrap();
        assert_eq!(
            forest.predict(&query(1.0, 1.0, 0)).unwrap_err(),
            DomainError::ModelNotFitted
        );
    }

    #[test]
    fn rejects_small_or_non_finite_input() {
        let mut forest = IsolationForest::new(IsolationForestParams::default()).unwrap();
        let small = Array2::from_shape_vec((2, 3), vec![1.0; 6]).unwrap();
        assert!(matches!(
            forest.fit(&small),
            Err(DomainError::InsufficientData { required: 5, actual: 2 })
        ));

        let mut data = reference();
        data[[3, 1]] = f64::NAN;
        assert!(matches!(forest.fit(&data), Err(DomainError::NonFinite { .. })));
    }

    #[test]
    fn contamination_outside_range_is_rejected() {
        for contamination in [0.0, 0.75, f64::NAN] {
            let params = IsolationForestParams {
                contamination,
                ..IsolationForestParams::default()
            };
            assert!(IsolationForest::new(params).is_err());
        }
    }

    #[test]
    fn path_length_constant() {
        assert_eq!(average_path_length(1), 0.0);
        assert_eq!(average_path_length(2), 1.0);
        assert!((average_path_length(256) - 10.244).abs() < 1e-2);
    }
}
