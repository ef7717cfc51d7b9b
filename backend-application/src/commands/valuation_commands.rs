use std::path::Path;

use tracing::{info, warn};

use backend_domain::ports::{ListingRepository, ModelStore};
use backend_domain::services::{train_valuation_model, ValuationModel, ValuationParams};
use backend_domain::LandListing;

use crate::commands::anomaly_commands::parse_number;
use crate::dtos::{round2, ValuationRequest, ValuationResponse};
use crate::{AppError, AppState};

/// Trains a model from a listing CSV and persists it through `store`.
pub async fn train_and_save(
    listings: &dyn ListingRepository,
    store: &dyn ModelStore,
    path: &Path,
    params: ValuationParams,
) -> Result<ValuationModel, AppError> {
    let batch = listings.load_listings(path).await?;
    for row in &batch.rejected {
        warn!(line = row.line, "dropped listing: {}", row.reason);
    }
    info!(path = %path.display(), listings = batch.listings.len(), "training valuation model");

    let data = batch.listings;
    let model = tokio::task::spawn_blocking(move || train_valuation_model(&data, &params))
        .await
        .map_err(|err| AppError::Internal(err.into()))??;

    store.save_valuation_model(&model).await?;
    info!(
        model_id = %model.model_id,
        mae = model.metrics.mae,
        rmse = model.metrics.rmse,
        r2 = model.metrics.r2,
        "valuation model saved"
    );
    Ok(model)
}

pub async fn predict_price(state: &AppState, request: &ValuationRequest) -> Result<ValuationResponse, AppError> {
    let model = state
        .valuation
        .as_ref()
        .ok_or_else(|| AppError::Unavailable("valuation model not loaded".to_string()))?;

    let listing = parse_listing(request).inspect_err(|_| state.metrics.record_rejected())?;
    let price = model.predict(&listing)?;
    state.metrics.record_valuation();
    Ok(ValuationResponse {
        predicted_price: round2(price),
        model_id: model.model_id.to_string(),
    })
}

fn parse_listing(request: &ValuationRequest) -> Result<LandListing, AppError> {
    let area = parse_number(Some(&request.area_sqft), "area_sqft", "Area")?;
    let proximity = parse_number(
        Some(&request.proximity_to_highway_km),
        "proximity_to_highway_km",
        "Proximity to highway",
    )?;
    let rating = parse_number(
        Some(&request.land_quality_rating),
        "land_quality_rating",
        "Land quality rating",
    )?;
    Ok(LandListing::new(
        area,
        proximity,
        rating,
        request.location.as_str(),
        request.property_type.as_str(),
    )?)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::test_support::{state_with_baseline, FakeListings, MemoryModelStore};
    use backend_domain::{LabeledListing, ListingBatch};

    fn listings() -> ListingBatch {
        let listings = (0..30)
            .map(|i| {
                let area = 1000.0 + 100.0 * i as f64;
                let location = if i % 2 == 0 { "Rural" } else { "Urban" };
                LabeledListing {
                    listing: LandListing::new(area, 1.0, 5.0, location, "Residential").unwrap(),
                    price: area * 500.0,
                }
            })
            .collect();
        ListingBatch {
            listings,
            rejected: Vec::new(),
        }
    }

    fn params() -> ValuationParams {
        ValuationParams {
            n_estimators: 10,
            ..ValuationParams::default()
        }
    }

    #[tokio::test]
    async fn trained_model_is_saved_and_serves_predictions() {
        let repo = FakeListings(listings());
        let store = MemoryModelStore::default();
        let model = train_and_save(&repo, &store, Path::new("land.csv"), params()).await.unwrap();
        assert!(store.load_valuation_model().await.unwrap().is_some());

        let mut state = state_with_baseline();
        state.valuation = Some(Arc::new(model));
        let response = predict_price(
            &state,
            &ValuationRequest {
                area_sqft: "2000".into(),
                proximity_to_highway_km: 1.0.into(),
                land_quality_rating: 5.0.into(),
                location: "Urban".to_string(),
                property_type: "Residential".to_string(),
            },
        )
        .await
        .unwrap();
        assert!(response.predicted_price > 500_000.0 && response.predicted_price < 1_500_000.0);
        assert!(state.metrics.render_prometheus().contains("landrec_valuations_total 1\n"));
    }

    #[tokio::test]
    async fn prediction_without_model_is_unavailable() {
        let state = state_with_baseline();
        let request = ValuationRequest {
            area_sqft: 1.0.into(),
            proximity_to_highway_km: 1.0.into(),
            land_quality_rating: 1.0.into(),
            location: "Urban".to_string(),
            property_type: "Residential".to_string(),
        };
        assert!(matches!(
            predict_price(&state, &request).await,
            Err(AppError::Unavailable(_))
        ));
    }

    #[test]
    fn listing_fields_are_validated() {
        let request = ValuationRequest {
            area_sqft: "wide".into(),
            proximity_to_highway_km: 1.0.into(),
            land_quality_rating: 1.0.into(),
            location: "Urban".to_string(),
            property_type: "Residential".to_string(),
        };
        let err = parse_listing(&request).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref msg) if msg == "Invalid area"));
    }
}
