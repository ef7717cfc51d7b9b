use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;

use backend_application::commands::anomaly_commands;
use backend_application::dtos::{DetectorInfo, TransactionCheckRequest, TransactionCheckResponse};
use backend_application::queries::model_queries;
use backend_application::AppState;

use crate::error::{rejected_body, HttpError};
use crate::middleware::authorize;

pub async fn check_transaction(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<TransactionCheckRequest>, JsonRejection>,
) -> Result<Json<TransactionCheckResponse>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let Json(payload) = payload.map_err(|rejection| rejected_body(&state.metrics, rejection.body_text()))?;
    let scored = anomaly_commands::check_transaction(&state, &payload).await?;
    Ok(Json(TransactionCheckResponse::from(&scored)))
}

pub async fn get_detector(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<DetectorInfo>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    Ok(Json(model_queries::describe_detector(&state)))
}
