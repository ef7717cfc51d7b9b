use axum::routing::{get, post};
use axum::Router;

use backend_application::AppState;

use crate::handlers::{
    anomaly_handlers, assistant_handlers, ops_handlers, page_handlers, valuation_handlers,
};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/",
            get(page_handlers::check_page).post(page_handlers::submit_check),
        )
        .route(
            "/v1/anomaly/check",
            post(anomaly_handlers::check_transaction),
        )
        .route(
            "/v1/anomaly/detector",
            get(anomaly_handlers::get_detector),
        )
        .route(
            "/v1/valuation/predict",
            post(valuation_handlers::predict_price),
        )
        .route(
            "/v1/valuation/model",
            get(valuation_handlers::get_valuation_model),
        )
        .route(
            "/v1/assistant/ask",
            post(assistant_handlers::ask_assistant),
        )
        .route("/v1/ops/health/live", get(ops_handlers::health_live))
        .route("/v1/ops/health/ready", get(ops_handlers::health_ready))
        .route(
            "/v1/ops/metrics/prometheus",
            get(ops_handlers::metrics_prometheus),
        )
        .with_state(state)
}
