use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;

use backend_application::commands::valuation_commands;
use backend_application::dtos::{ValuationModelInfo, ValuationRequest, ValuationResponse};
use backend_application::queries::model_queries;
use backend_application::AppState;

use crate::error::{rejected_body, HttpError};
use crate::middleware::authorize;

pub async fn predict_price(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<ValuationRequest>, JsonRejection>,
) -> Result<Json<ValuationResponse>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let Json(payload) = payload.map_err(|rejection| rejected_body(&state.metrics, rejection.body_text()))?;
    let response = valuation_commands::predict_price(&state, &payload).await?;
    Ok(Json(response))
}

pub async fn get_valuation_model(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ValuationModelInfo>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    Ok(Json(model_queries::describe_valuation_model(&state)?))
}
