use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;

use backend_application::commands::assistant_commands;
use backend_application::dtos::AssistantQuestion;
use backend_application::AppState;
use backend_domain::AssistantReply;

use crate::error::{rejected_body, HttpError};
use crate::middleware::authorize;

pub async fn ask_assistant(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<AssistantQuestion>, JsonRejection>,
) -> Result<Json<AssistantReply>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let Json(payload) = payload.map_err(|rejection| rejected_body(&state.metrics, rejection.body_text()))?;
    let reply = assistant_commands::ask_assistant(&state, &payload.question).await?;
    Ok(Json(reply))
}
