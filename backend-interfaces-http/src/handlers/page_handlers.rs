use axum::extract::{FromRequest, Request, State};
use axum::http::header;
use axum::response::{Html, IntoResponse, Response};
use axum::{Form, Json};

use backend_application::commands::anomaly_commands;
use backend_application::dtos::{TransactionCheckRequest, TransactionCheckResponse};
use backend_application::AppState;

use crate::error::{rejected_body, HttpError};
use crate::pages;

pub async fn check_page() -> Html<String> {
    Html(pages::check_form())
}

/// JSON bodies get a JSON verdict; anything else is treated as the HTML
/// form and answered with a result page.
pub async fn submit_check(State(state): State<AppState>, request: Request) -> Result<Response, HttpError> {
    let is_json = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.starts_with("application/json"))
        .unwrap_or(false);

    if is_json {
        let Json(payload) = Json::<TransactionCheckRequest>::from_request(request, &state)
            .await
            .map_err(|rejection| rejected_body(&state.metrics, rejection.body_text()))?;
        let scored = anomaly_commands::check_transaction(&state, &payload).await?;
        return Ok(Json(TransactionCheckResponse::from(&scored)).into_response());
    }

    let Form(payload) = Form::<TransactionCheckRequest>::from_request(request, &state)
        .await
        .map_err(|rejection| rejected_body(&state.metrics, rejection.body_text()))?;
    let scored = anomaly_commands::check_transaction(&state, &payload).await?;
    Ok(Html(pages::check_result(&scored)).into_response())
}
