use backend_domain::FEATURE_NAMES;

use crate::dtos::{DetectorInfo, ValuationModelInfo};
use crate::{AppError, AppState};

pub fn describe_detector(state: &AppState) -> DetectorInfo {
    let params = state.detector.params();
    DetectorInfo {
        features: FEATURE_NAMES.to_vec(),
        n_estimators: params.n_estimators,
        contamination: params.contamination,
        offset: state.detector.offset(),
        random_seed: params.seed,
    }
}

pub fn describe_valuation_model(state: &AppState) -> Result<ValuationModelInfo, AppError> {
    let model = state
        .valuation
        .as_ref()
        .ok_or_else(|| AppError::Unavailable("valuation model not loaded".to_string()))?;
    Ok(ValuationModelInfo {
        model_id: model.model_id.to_string(),
        trained_at: model.trained_at,
        schema_version: model.schema.version,
        schema_fingerprint: model.schema.fingerprint.clone(),
        features: model.schema.names().into_iter().map(str::to_string).collect(),
        metrics: model.metrics,
        importances: model.importances.clone(),
        locations: model.locations.clone(),
        property_types: model.property_types.clone(),
        n_train: model.n_train,
        n_test: model.n_test,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::state_with_baseline;

    #[test]
    fn detector_description_reflects_params() {
        let info = describe_detector(&state_with_baseline());
        assert_eq!(info.features, vec!["price_per_sqm", "price_ratio", "days_since_prev"]);
        assert_eq!(info.n_estimators, 100);
        assert_eq!(info.contamination, 0.2);
        assert!(info.offset < 0.0);
    }

    #[test]
    fn missing_valuation_model_is_unavailable() {
        assert!(matches!(
            describe_valuation_model(&state_with_baseline()),
            Err(AppError::Unavailable(_))
        ));
    }
}
