//! Land price model: one-hot encoded listings fed to a regression forest.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use super::evaluation::{regression_metrics, train_test_split};
use super::random_forest::RandomForestRegressor;
use crate::entities::{
    FeatureImportance, FeatureSchema, LabeledListing, LandListing, RegressionMetrics, AREA_COLUMN,
    HIGHWAY_COLUMN, LOCATION_FIELD, PROPERTY_TYPE_FIELD, QUALITY_COLUMN,
};
use crate::errors::{DomainError, DomainResult};
use crate::value_objects::ModelId;

pub const MIN_TRAINING_LISTINGS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationParams {
    pub n_estimators: usize,
    pub test_fraction: f64,
    pub seed: u64,
}

impl Default for ValuationParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            test_fraction: 0.2,
            seed: 42,
        }
    }
}

/// Trained valuation model together with the schema it was trained on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValuationModel {
    pub model_id: ModelId,
    pub trained_at: DateTime<Utc>,
    pub schema: FeatureSchema,
    pub forest: RandomForestRegressor,
    pub metrics: RegressionMetrics,
    pub importances: Vec<FeatureImportance>,
    pub locations: Vec<String>,
    pub property_types: Vec<String>,
    pub n_train: usize,
    pub n_test: usize,
}

impl ValuationModel {
    /// Checks a loaded artifact before it is used for inference.
    pub fn validate(&self) -> DomainResult<()> {
        self.schema.validate()?;
        if !self.forest.is_fitted() {
            return Err(DomainError::ModelNotFitted);
        }
        if self.forest.n_features() != self.schema.width() {
            return Err(DomainError::SchemaMismatch(format!(
                "forest expects {} features but schema has {}",
                self.forest.n_features(),
                self.schema.width()
            )));
        }
        Ok(())
    }

    pub fn encode(&self, listing: &LandListing) -> DomainResult<Vec<f64>> {
        let row = self
            .schema
            .encode(&listing.numeric_values(), &listing.categorical_values())?;
        if row.len() != self.forest.n_features() {
            return Err(DomainError::SchemaMismatch(format!(
                "forest expects {} features, listing encoded to {}",
                self.forest.n_features(),
                row.len()
            )));
        }
        Ok(row)
    }

    pub fn predict(&self, listing: &LandListing) -> DomainResult<f64> {
        let row = Array1::from_vec(self.encode(listing)?);
        let price = self.forest.predict_row(row.view())?;
        if !price.is_finite() {
            return Err(DomainError::NonFinite {
                field: "predicted price".to_string(),
            });
        }
        Ok(price)
    }
}

pub fn train_valuation_model(listings: &[LabeledListing], params: &ValuationParams) -> DomainResult<ValuationModel> {
    if listings.len() < MIN_TRAINING_LISTINGS {
        return Err(DomainError::InsufficientData {
            required: MIN_TRAINING_LISTINGS,
            actual: listings.len(),
        });
    }
    if params.n_estimators == 0 {
        return Err(DomainError::InvalidParameter(
            "n_estimators must be greater than 0".to_string(),
        ));
    }

    let locations = distinct(listings.iter().map(|l| l.listing.location.as_str()));
    let property_types = distinct(listings.iter().map(|l| l.listing.property_type.as_str()));
    let schema = FeatureSchema::one_hot(
        &[AREA_COLUMN, HIGHWAY_COLUMN, QUALITY_COLUMN],
        &[
            (LOCATION_FIELD, locations.clone()),
            (PROPERTY_TYPE_FIELD, property_types.clone()),
        ],
    )?;

    let mut x = Array2::zeros((listings.len(), schema.width()));
    let mut y = Array1::zeros(listings.len());
    for (i, labeled) in listings.iter().enumerate() {
        if !labeled.price.is_finite() {
            return Err(DomainError::NonFinite {
                field: format!("price of listing {i}"),
            });
        }
        let row = schema.encode(
            &labeled.listing.numeric_values(),
            &labeled.listing.categorical_values(),
        )?;
        x.row_mut(i).assign(&Array1::from_vec(row));
        y[i] = labeled.price;
    }

    let (train_idx, test_idx) = train_test_split(listings.len(), params.test_fraction, params.seed)?;
    let x_train = x.select(Axis(0), &train_idx);
    let y_train = y.select(Axis(0), &train_idx);
    let x_test = x.select(Axis(0), &test_idx);
    let y_test = y.select(Axis(0), &test_idx);

    let mut forest = RandomForestRegressor::new(params.n_estimators).with_random_state(params.seed);
    forest.fit(&x_train, &y_train)?;
    let metrics = regression_metrics(&y_test, &forest.predict(&x_test)?)?;

    let mut importances: Vec<FeatureImportance> = schema
        .names()
        .into_iter()
        .zip(forest.feature_importances().unwrap_or_default())
        .map(|(feature, importance)| FeatureImportance {
            feature: feature.to_string(),
            importance: *importance,
        })
        .collect();
    importances.sort_by(|a, b| b.importance.total_cmp(&a.importance));

    Ok(ValuationModel {
        model_id: ModelId::generate(),
        trained_at: Utc::now(),
        schema,
        forest,
        metrics,
        importances,
        locations,
        property_types,
        n_train: train_idx.len(),
        n_test: test_idx.len(),
    })
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    values
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}
