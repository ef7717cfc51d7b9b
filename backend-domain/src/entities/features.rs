// Feature vector entity
// Ratios derived from a transaction, in detector column order

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::errors::{DomainError, DomainResult};

pub const FEATURE_NAMES: [&str; 3] = ["price_per_sqm", "price_ratio", "days_since_prev"];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub price_per_sqm: f64,
    pub price_ratio: f64,
    pub days_since_prev: i64,
}

impl FeatureVector {
    pub fn new(price_per_sqm: f64, price_ratio: f64, days_since_prev: i64) -> DomainResult<Self> {
        let vector = Self {
            price_per_sqm,
            price_ratio,
            days_since_prev,
        };
        vector.ensure_finite()?;
        Ok(vector)
    }

    pub fn to_row(&self) -> [f64; 3] {
        [self.price_per_sqm, self.price_ratio, self.days_since_prev as f64]
    }

    fn ensure_finite(&self) -> DomainResult<()> {
        for (name, value) in FEATURE_NAMES.iter().zip(self.to_row()) {
            if !value.is_finite() {
                return Err(DomainError::NonFinite {
                    field: (*name).to_string(),
                });
            }
        }
        Ok(())
    }
}

pub fn feature_matrix(vectors: &[FeatureVector]) -> Array2<f64> {
    let mut matrix = Array2::zeros((vectors.len(), FEATURE_NAMES.len()));
    for (mut row, vector) in matrix.rows_mut().into_iter().zip(vectors) {
        for (cell, value) in row.iter_mut().zip(vector.to_row()) {
            *cell = value;
        }
    }
    matrix
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matrix_keeps_column_order() {
        let vectors = [
            FeatureVector::new(3000.0, 0.9, 365).unwrap(),
            FeatureVector::new(10000.0, 1.8, 10).unwrap(),
        ];
        let matrix = feature_matrix(&vectors);
        assert_eq!(matrix.dim(), (2, 3));
        assert_eq!(matrix[[1, 0]], 10000.0);
        assert_eq!(matrix[[1, 1]], 1.8);
        assert_eq!(matrix[[1, 2]], 10.0);
    }

    #[test]
    fn rejects_infinite_ratio() {
        let err = FeatureVector::new(f64::INFINITY, 1.0, 0).unwrap_err();
        assert_eq!(
            err,
            DomainError::NonFinite {
                field: "price_per_sqm".to_string()
            }
        );
    }
}
