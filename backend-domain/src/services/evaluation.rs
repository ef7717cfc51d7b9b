use ndarray::Array1;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::entities::RegressionMetrics;
use crate::errors::{DomainError, DomainResult};

/// Shuffled train/test index split.
///
/// The test side gets `ceil(n * test_fraction)` rows; both sides must end up
/// non-empty.
pub fn train_test_split(n: usize, test_fraction: f64, seed: u64) -> DomainResult<(Vec<usize>, Vec<usize>)> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(DomainError::InvalidParameter(format!(
            "test_fraction must be in (0, 1), got {test_fraction}"
        )));
    }
    let n_test = (n as f64 * test_fraction).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(DomainError::InsufficientData {
            required: 2,
            actual: n,
        });
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);
    let train = indices.split_off(n_test);
    Ok((train, indices))
}

pub fn regression_metrics(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> DomainResult<RegressionMetrics> {
    if y_true.len() != y_pred.len() {
        return Err(DomainError::InvalidParameter(format!(
            "{} targets but {} predictions",
            y_true.len(),
            y_pred.len()
        )));
    }
    if y_true.is_empty() {
        return Err(DomainError::InsufficientData {
            required: 1,
            actual: 0,
        });
    }

    let n = y_true.len() as f64;
    let residuals = y_true - y_pred;
    let mae = residuals.mapv(f64::abs).sum() / n;
    let ss_res = residuals.mapv(|r| r * r).sum();
    let rmse = (ss_res / n).sqrt();

    let mean = y_true.sum() / n;
    let ss_tot = y_true.mapv(|v| (v - mean) * (v - mean)).sum();
    let r2 = if ss_tot == 0.0 {
        if ss_res == 0.0 {
            1.0
        } else {
            0.0
        }
    } else {
        1.0 - ss_res / ss_tot
    };

    Ok(RegressionMetrics { mae, rmse, r2 })
}
