// Valuation entities
// Land listings used to train and query the price model

use serde::{Deserialize, Serialize};

use crate::entities::require_positive;
use crate::errors::{DomainError, DomainResult};

pub const AREA_COLUMN: &str = "Area_SqFt";
pub const HIGHWAY_COLUMN: &str = "Proximity_to_Highway_km";
pub const QUALITY_COLUMN: &str = "Land_Quality_Rating";
pub const LOCATION_FIELD: &str = "Location";
pub const PROPERTY_TYPE_FIELD: &str = "Property_Type";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandListing {
    pub area_sqft: f64,
    pub proximity_to_highway_km: f64,
    pub land_quality_rating: f64,
    pub location: String,
    pub property_type: String,
}

impl LandListing {
    pub fn new(
        area_sqft: f64,
        proximity_to_highway_km: f64,
        land_quality_rating: f64,
        location: impl Into<String>,
        property_type: impl Into<String>,
    ) -> DomainResult<Self> {
        let area_sqft = require_positive("area_sqft", "Area", area_sqft)?;
        if !proximity_to_highway_km.is_finite() || proximity_to_highway_km < 0.0 {
            return Err(DomainError::validation(
                "proximity_to_highway_km",
                "Proximity to highway must be zero or positive",
            ));
        }
        if !land_quality_rating.is_finite() {
            return Err(DomainError::validation(
                "land_quality_rating",
                "Invalid land quality rating",
            ));
        }
        let location = location.into().trim().to_string();
        if location.is_empty() {
            return Err(DomainError::validation("location", "Location is required"));
        }
        let property_type = property_type.into().trim().to_string();
        if property_type.is_empty() {
            return Err(DomainError::validation(
                "property_type",
                "Property type is required",
            ));
        }
        Ok(Self {
            area_sqft,
            proximity_to_highway_km,
            land_quality_rating,
            location,
            property_type,
        })
    }

    pub fn numeric_values(&self) -> [(&'static str, f64); 3] {
        [
            (AREA_COLUMN, self.area_sqft),
            (HIGHWAY_COLUMN, self.proximity_to_highway_km),
            (QUALITY_COLUMN, self.land_quality_rating),
        ]
    }

    pub fn categorical_values(&self) -> [(&'static str, &str); 2] {
        [
            (LOCATION_FIELD, self.location.as_str()),
            (PROPERTY_TYPE_FIELD, self.property_type.as_str()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledListing {
    pub listing: LandListing,
    pub price: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    pub mae: f64,
    pub rmse: f64,
    pub r2: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}
