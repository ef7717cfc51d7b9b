// Transaction entity
// A single recorded sale of a land parcel

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::{DomainError, DomainResult};
use crate::value_objects::ParcelId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub parcel_id: ParcelId,
    pub transaction_date: NaiveDate,
    pub sale_price: f64,
    pub market_value: f64,
    pub land_area: f64,
}

impl TransactionRecord {
    pub fn new(
        parcel_id: ParcelId,
        transaction_date: NaiveDate,
        sale_price: f64,
        market_value: f64,
        land_area: f64,
    ) -> DomainResult<Self> {
        Ok(Self {
            parcel_id,
            transaction_date,
            sale_price: require_positive("sale_price", "Sale price", sale_price)?,
            market_value: require_positive("market_value", "Market value", market_value)?,
            land_area: require_positive("land_area", "Land area", land_area)?,
        })
    }
}

/// Rejects NaN, infinities, zero and negatives with a field-specific message.
pub fn require_positive(field: &'static str, label: &str, value: f64) -> DomainResult<f64> {
    if !value.is_finite() {
        return Err(DomainError::validation(field, format!("Invalid {}", label.to_lowercase())));
    }
    if value <= 0.0 {
        return Err(DomainError::validation(field, format!("{label} must be positive")));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn accepts_positive_fields() {
        let record =
            TransactionRecord::new(ParcelId::new("P1"), date(2023, 1, 1), 350_000.0, 320_000.0, 100.0)
                .unwrap();
        assert_eq!(record.parcel_id.as_str(), "P1");
    }

    #[test]
    fn rejects_non_positive_land_area() {
        for area in [0.0, -5.0] {
            let err = TransactionRecord::new(ParcelId::new("P1"), date(2023, 1, 1), 1.0, 1.0, area)
                .unwrap_err();
            assert_eq!(
                err,
                DomainError::Validation {
                    field: "land_area",
                    message: "Land area must be positive".to_string(),
                }
            );
        }
    }

    #[test]
    fn rejects_nan_sale_price() {
        let err = TransactionRecord::new(ParcelId::new("P1"), date(2023, 1, 1), f64::NAN, 1.0, 1.0)
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid sale price");
    }
}
