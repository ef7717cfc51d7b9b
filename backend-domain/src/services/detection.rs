use super::features::derive_batch;
use super::isolation_forest::{IsolationForest, IsolationForestParams};
use crate::entities::{feature_matrix, AnomalyScore, FeatureVector, ScoredTransaction, TransactionRecord};
use crate::errors::{DomainError, DomainResult};

/// Seven-point baseline the online detector falls back to when no
/// reference file is configured.
const BASELINE: [(f64, f64, i64); 7] = [
    (3000.0, 0.9, 365),
    (3200.0, 1.0, 180),
    (3100.0, 1.1, 400),
    (2900.0, 0.95, 220),
    (3050.0, 1.2, 300),
    (4500.0, 1.0, 60),
    (10000.0, 1.8, 10),
];

pub fn baseline_reference() -> Vec<FeatureVector> {
    BASELINE
        .iter()
        .map(|&(price_per_sqm, price_ratio, days_since_prev)| FeatureVector {
            price_per_sqm,
            price_ratio,
            days_since_prev,
        })
        .collect()
}

pub fn fit_detector(reference: &[FeatureVector], params: IsolationForestParams) -> DomainResult<IsolationForest> {
    let mut forest = IsolationForest::new(params)?;
    forest.fit(&feature_matrix(reference))?;
    Ok(forest)
}

pub fn score_features(detector: &IsolationForest, features: &[FeatureVector]) -> DomainResult<Vec<AnomalyScore>> {
    if !detector.is_fitted() {
        return Err(DomainError::ModelNotFitted);
    }
    if features.is_empty() {
        return Ok(Vec::new());
    }
    detector.predict(&feature_matrix(features))
}

/// Fit-predict over a whole history: the detector is fit on the batch
/// itself and every record is scored against it.
pub fn detect_batch(
    records: Vec<TransactionRecord>,
    params: IsolationForestParams,
) -> DomainResult<(IsolationForest, Vec<ScoredTransaction>)> {
    if records.is_empty() {
        return Err(DomainError::InsufficientData {
            required: super::isolation_forest::MIN_FIT_SAMPLES,
            actual: 0,
        });
    }
    let (records, features): (Vec<TransactionRecord>, Vec<FeatureVector>) =
        derive_batch(records)?.into_iter().unzip();
    let detector = fit_detector(&features, params)?;
    let verdicts = score_features(&detector, &features)?;

    let scored = records
        .into_iter()
        .zip(features)
        .zip(verdicts)
        .map(|((record, features), verdict)| ScoredTransaction {
            record,
            features,
            verdict,
        })
        .collect();
    Ok((detector, scored))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::AnomalyLabel;
    use crate::value_objects::ParcelId;
    use chrono::NaiveDate;

    #[test]
    fn baseline_detector_labels_reference_points() {
        let detector = fit_detector(&baseline_reference(), IsolationForestParams::default()).unwrap();
        let samples = [
            FeatureVector::new(10000.0, 1.8, 10).unwrap(),
            FeatureVector::new(3100.0, 1.1, 400).unwrap(),
        ];
        let labels: Vec<AnomalyLabel> = score_features(&detector, &samples)
            .unwrap()
            .into_iter()
            .map(|score| score.label)
            .collect();
        assert_eq!(labels, vec![AnomalyLabel::Anomalous, AnomalyLabel::Normal]);
    }

    #[test]
    fn batch_detection_flags_outlier_sale() {
        let day = |d: u32| NaiveDate::from_ymd_opt(2023, 1, d).unwrap();
        let mut records = Vec::new();
        for (i, price) in [300_000.0, 310_000.0, 305_000.0, 295_000.0, 302_000.0, 298_000.0, 2_900_000.0]
            .into_iter()
            .enumerate()
        {
            records.push(
                TransactionRecord::new(
                    ParcelId::new(format!("P{i}")),
                    day(i as u32 + 1),
                    price,
                    300_000.0,
                    100.0,
                )
                .unwrap(),
            );
        }

        let (detector, scored) = detect_batch(records, IsolationForestParams::default()).unwrap();
        assert!(detector.is_fitted());
        assert_eq!(scored.len(), 7);
        let outlier = scored
            .iter()
            .find(|s| s.record.parcel_id.as_str() == "P6")
            .unwrap();
        assert!(outlier.verdict.is_anomaly());
    }

    #[test]
    fn unfitted_detector_cannot_score_even_nothing() {
        let detector = IsolationForest::new(IsolationForestParams::default()).unwrap();
        assert_eq!(score_features(&detector, &[]).unwrap_err(), DomainError::ModelNotFitted);

        let fitted = fit_detector(&baseline_reference(), IsolationForestParams::default()).unwrap();
        assert!(score_features(&fitted, &[]).unwrap().is_empty());
    }

    #[test]
    fn empty_batch_is_insufficient() {
        assert!(matches!(
            detect_batch(Vec::new(), IsolationForestParams::default()),
            Err(DomainError::InsufficientData { actual: 0, .. })
        ));
    }
}
