use std::sync::Arc;

use backend_domain::ports::{HealthCheckService, RegistrationAssistant};
use backend_domain::services::{IsolationForest, ValuationModel};
use backend_domain::RuntimeConfig;

use crate::Metrics;

/// Shared by every request. Fitted models are read-only for the lifetime
/// of the process, so they sit behind plain `Arc`s.
#[derive(Clone)]
pub struct AppState {
    pub config: RuntimeConfig,
    pub detector: Arc<IsolationForest>,
    pub valuation: Option<Arc<ValuationModel>>,
    pub assistant: Arc<dyn RegistrationAssistant>,
    pub health_service: Arc<dyn HealthCheckService>,
    pub metrics: Arc<Metrics>,
}
