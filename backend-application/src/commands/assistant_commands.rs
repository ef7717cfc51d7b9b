use tracing::{error, info};

use backend_domain::AssistantReply;

use crate::{AppError, AppState};

pub async fn ask_assistant(state: &AppState, question: &str) -> Result<AssistantReply, AppError> {
    let question = question.trim();
    if question.is_empty() {
        state.metrics.record_rejected();
        return Err(AppError::BadRequest("Question is required".to_string()));
    }
    if !state.assistant.is_configured() {
        return Err(AppError::Unavailable("assistant not configured".to_string()));
    }

    state.metrics.record_assistant_request();
    let reply = state.assistant.ask(question).await.map_err(|err| {
        error!("assistant request failed: {:#}", err);
        AppError::Internal(err)
    })?;
    info!(model = %reply.model, answer_len = reply.answer.len(), "assistant answered");
    Ok(reply)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::test_support::{state_with_baseline, EchoAssistant};

    #[tokio::test]
    async fn forwards_trimmed_question() {
        let state = state_with_baseline();
        let reply = ask_assistant(&state, "  How do I register a plot?  ").await.unwrap();
        assert_eq!(reply.answer, "echo: How do I register a plot?");
    }

    #[tokio::test]
    async fn empty_question_is_rejected() {
        let state = state_with_baseline();
        assert!(matches!(
            ask_assistant(&state, "   ").await,
            Err(AppError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn unconfigured_assistant_is_unavailable() {
        let mut state = state_with_baseline();
        state.assistant = Arc::new(EchoAssistant { configured: false });
        assert!(matches!(
            ask_assistant(&state, "Stamp duty?").await,
            Err(AppError::Unavailable(_))
        ));
    }
}
