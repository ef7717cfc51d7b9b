//! Random forest regressor: bootstrap-aggregated regression trees

use ndarray::{Array1, Array2, ArrayView1, Axis};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::decision_tree::DecisionTreeRegressor;
use crate::errors::{DomainError, DomainResult};

/// Bootstrap forest of fully grown trees; each tree sees every feature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForestRegressor {
    trees: Vec<DecisionTreeRegressor>,
    pub n_estimators: usize,
    pub random_state: u64,
    n_features: usize,
    feature_importances: Option<Vec<f64>>,
}

impl RandomForestRegressor {
    pub fn new(n_estimators: usize) -> Self {
        Self {
            trees: Vec::new(),
            n_estimators,
            random_state: 42,
            n_features: 0,
            feature_importances: None,
        }
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Normalised to sum to 1 (all zeros when no split was ever made).
    pub fn feature_importances(&self) -> Option<&[f64]> {
        self.feature_importances.as_deref()
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
        if n_samples < 2 {
            return Err(DomainError::InsufficientData {
                required: 2,
                actual: n_samples,
            });
        }
        if self.n_estimators == 0 {
            return Err(DomainError::InvalidParameter(
                "n_estimators must be greater than 0".to_string(),
            ));
        }
        if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
            return Err(DomainError::NonFinite {
                field: "training data".to_string(),
            });
        }

        let n_features = x.ncols();
        let base_seed = self.random_state;

        let trees: DomainResult<Vec<DecisionTreeRegressor>> = (0..self.n_estimators)
            .into_par_iter()
            .map(|tree_idx| {
                let mut rng = ChaCha8Rng::seed_from_u64(base_seed.wrapping_add(tree_idx as u64));

                let sample_indices: Vec<usize> = (0..n_samples)
                    .map(|_| (rng.next_u64() % n_samples as u64) as usize)
                    .collect();
                let x_boot = x.select(Axis(0), &sample_indices);
                let y_boot = y.select(Axis(0), &sample_indices);

                let mut tree = DecisionTreeRegressor::new();
                tree.fit(&x_boot, &y_boot)?;
                Ok(tree)
            })
            .collect();

        self.trees = trees?;
        self.n_features = n_features;
        self.compute_feature_importances();
        Ok(())
    }

    fn compute_feature_importances(&mut self) {
        let mut totals = vec![0.0; self.n_features];
        for tree in &self.trees {
            let raw = tree.raw_importances();
            let tree_total: f64 = raw.iter().sum();
            if tree_total <= 0.0 {
                continue;
            }
            for (total, value) in totals.iter_mut().zip(raw) {
                *total += value / tree_total;
            }
        }
        let sum: f64 = totals.iter().sum();
        if sum > 0.0 {
            for value in &mut totals {
                *value /= sum;
            }
        }
        self.feature_importances = Some(totals);
    }

    pub fn predict_row(&self, sample: ArrayView1<'_, f64>) -> DomainResult<f64> {
        if self.trees.is_empty() {
            return Err(DomainError::ModelNotFitted);
        }
        let mut total = 0.0;
        for tree in &self.trees {
            total += tree.predict_row(sample)?;
        }
        Ok(total / self.trees.len() as f64)
    }

    pub fn predict(&self, x: &Array2<f64>) -> DomainResult<Array1<f64>> {
        let predictions = x
            .rows()
            .into_iter()
            .map(|row| self.predict_row(row))
            .collect::<DomainResult<Vec<f64>>>()?;
        Ok(Array1::from_vec(predictions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear_data() -> (Array2<f64>, Array1<f64>) {
        let n = 60;
        let mut x = Array2::zeros((n, 2));
        let mut y = Array1::zeros(n);
        for i in 0..n {
            let a = i as f64;
            let noise = ((i * 7) % 5) as f64;
            x[[i, 0]] = a;
            x[[i, 1]] = noise;
            y[i] = 3.0 * a + 10.0;
        }
        (x, y)
    }

    #[test]
    fn learns_monotone_relationship() {
        let (x, y) = linear_data();
        let mut forest = RandomForestRegressor::new(30).with_random_state(7);
        forest.fit(&x, &y).unwrap();

        let low = forest.predict_row(ndarray::array![5.0, 1.0].view()).unwrap();
        let high = forest.predict_row(ndarray::array![55.0, 1.0].view()).unwrap();
        assert!(high > low);
        assert!((low - 25.0).abs() < 15.0);
        assert!((high - 175.0).abs() < 15.0);

        let importances = forest.feature_importances().unwrap();
        assert!(importances[0] > importances[1]);
        assert!((importances.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn fit_is_deterministic_for_seed() {
        let (x, y) = linear_data();
        let mut a = RandomForestRegressor::new(10).with_random_state(3);
        let mut b = RandomForestRegressor::new(10).with_random_state(3);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();
        assert_eq!(a.predict(&x).unwrap(), b.predict(&x).unwrap());
    }

    #[test]
    fn predict_before_fit_fails() {
        let forest = RandomForestRegressor::new(5);
        assert_eq!(
            forest.predict_row(ndarray::array![1.0].view()).unwrap_err(),
            DomainError::ModelNotFitted
        );
    }

    #[test]
    fn wrong_width_is_schema_mismatch() {
        let (x, y) = linear_data();
        let mut forest = RandomForestRegressor::new(3);
        forest.fit(&x, &y).unwrap();
        assert!(matches!(
            forest.predict_row(ndarray::array![1.0, 2.0, 3.0].view()),
            Err(DomainError::SchemaMismatch(_))
        ));
    }
}
