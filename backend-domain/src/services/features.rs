use std::collections::HashMap;

use crate::entities::{FeatureVector, TransactionRecord};
use crate::errors::{DomainError, DomainResult};
use crate::value_objects::ParcelId;

/// Derives the detector features for one transaction.
///
/// `days_since_prev` is supplied by the caller; online requests have no
/// history to look it up from.
pub fn derive_features(record: &TransactionRecord, days_since_prev: i64) -> DomainResult<FeatureVector> {
    let price_per_sqm = ratio(record.sale_price, record.land_area, "land_area")?;
    let price_ratio = ratio(record.sale_price, record.market_value, "market_value")?;
    FeatureVector::new(price_per_sqm, price_ratio, days_since_prev)
}

/// Derives features for a whole history.
///
/// Records are ordered by parcel and then by date; each record's
/// `days_since_prev` is the gap to the previous sale of the same parcel,
/// 0 for a parcel's first sale. Rows without a parcel id share no history
/// and always get 0.
pub fn derive_batch(records: Vec<TransactionRecord>) -> DomainResult<Vec<(TransactionRecord, FeatureVector)>> {
    let mut records = records;
    records.sort_by(|a, b| {
        a.parcel_id
            .cmp(&b.parcel_id)
            .then(a.transaction_date.cmp(&b.transaction_date))
    });

    let mut previous: HashMap<ParcelId, chrono::NaiveDate> = HashMap::new();
    let mut derived = Vec::with_capacity(records.len());
    for record in records {
        let days_since_prev = if record.parcel_id.as_str().trim().is_empty() {
            0
        } else {
            let gap = previous
                .get(&record.parcel_id)
                .map(|prev| (record.transaction_date - *prev).num_days())
                .unwrap_or(0);
            previous.insert(record.parcel_id.clone(), record.transaction_date);
            gap
        };
        let features = derive_features(&record, days_since_prev)?;
        derived.push((record, features));
    }
    Ok(derived)
}

fn ratio(numerator: f64, denominator: f64, field: &'static str) -> DomainResult<f64> {
    if denominator == 0.0 {
        return Err(DomainError::DivisionByZero { field });
    }
    if !denominator.is_finite() || denominator < 0.0 {
        return Err(DomainError::validation(
            field,
            format!("{} must be positive", label(field)),
        ));
    }
    let value = numerator / denominator;
    if !value.is_finite() {
        return Err(DomainError::NonFinite {
            field: field.to_string(),
        });
    }
    Ok(value)
}

fn label(field: &str) -> &'static str {
    match field {
        "land_area" => "Land area",
        "market_value" => "Market value",
        _ => "Value",
    }
}
