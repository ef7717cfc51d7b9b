use tokio::time::{timeout, Duration};
use tracing::error;

use crate::dtos::ReadinessReport;
use crate::AppState;

pub async fn readiness(state: &AppState) -> ReadinessReport {
    let timeout_secs = state.config.request_timeout_seconds.max(1);
    let model_store_ok = match timeout(
        Duration::from_secs(timeout_secs),
        state.health_service.check_model_store(),
    )
    .await
    {
        Ok(Ok(ok)) => ok,
        Ok(Err(err)) => {
            error!("model store check failed: {}", err);
            false
        }
        Err(_) => {
            error!("model store check timeout after {}s", timeout_secs);
            false
        }
    };

    ReadinessReport {
        detector_fitted: state.detector.is_fitted(),
        valuation_loaded: state.valuation.is_some(),
        assistant_configured: state.assistant.is_configured(),
        model_store_ok,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::test_support::{state_with_baseline, StaticHealth};

    #[tokio::test]
    async fn ready_without_optional_features() {
        let report = readiness(&state_with_baseline()).await;
        assert!(report.is_ready());
        assert!(!report.valuation_loaded);
    }

    #[tokio::test]
    async fn failing_model_store_is_not_ready() {
        let mut state = state_with_baseline();
        state.health_service = Arc::new(StaticHealth(false));
        assert!(!readiness(&state).await.is_ready());
    }
}
