// In-memory ports for command and query tests

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use backend_domain::ports::{
    HealthCheckService, ListingRepository, ModelStore, RegistrationAssistant, TransactionRepository,
};
use backend_domain::services::{baseline_reference, fit_detector, IsolationForestParams, ValuationModel};
use backend_domain::{AssistantReply, ListingBatch, RuntimeConfig, TransactionBatch};

use crate::{AppState, Metrics};

#[derive(Default)]
pub struct FakeTransactions(pub TransactionBatch);

#[async_trait]
impl TransactionRepository for FakeTransactions {
    async fn load_transactions(&self, _path: &Path) -> anyhow::Result<TransactionBatch> {
        Ok(self.0.clone())
    }
}

#[derive(Default)]
pub struct FakeListings(pub ListingBatch);

#[async_trait]
impl ListingRepository for FakeListings {
    async fn load_listings(&self, _path: &Path) -> anyhow::Result<ListingBatch> {
        Ok(self.0.clone())
    }
}

#[derive(Default)]
pub struct MemoryModelStore {
    pub saved: Mutex<Option<ValuationModel>>,
}

#[async_trait]
impl ModelStore for MemoryModelStore {
    async fn load_valuation_model(&self) -> anyhow::Result<Option<ValuationModel>> {
        Ok(self.saved.lock().map_err(|_| anyhow::anyhow!("poisoned"))?.clone())
    }

    async fn save_valuation_model(&self, model: &ValuationModel) -> anyhow::Result<()> {
        *self.saved.lock().map_err(|_| anyhow::anyhow!("poisoned"))? = Some(model.clone());
        Ok(())
    }
}

pub struct EchoAssistant {
    pub configured: bool,
}

#[async_trait]
impl RegistrationAssistant for EchoAssistant {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn ask(&self, question: &str) -> anyhow::Result<AssistantReply> {
        Ok(AssistantReply {
            answer: format!("echo: {question}"),
            model: "echo".to_string(),
        })
    }
}

pub struct StaticHealth(pub bool);

#[async_trait]
impl HealthCheckService for StaticHealth {
    async fn check_model_store(&self) -> anyhow::Result<bool> {
        Ok(self.0)
    }
}

pub fn state_with_baseline() -> AppState {
    let detector = fit_detector(&baseline_reference(), IsolationForestParams::default()).unwrap();
    AppState {
        config: RuntimeConfig::default(),
        detector: Arc::new(detector),
        valuation: None,
        assistant: Arc::new(EchoAssistant { configured: true }),
        health_service: Arc::new(StaticHealth(true)),
        metrics: Arc::new(Metrics::default()),
    }
}
