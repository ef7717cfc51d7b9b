use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use tracing::{info, warn};

use backend_application::commands::valuation_commands;
use backend_application::{AppState, Metrics};
use backend_domain::ports::{ListingRepository, ModelStore, TransactionRepository};
use backend_domain::services::{baseline_reference, derive_batch, fit_detector, ValuationModel};
use backend_domain::{FeatureVector, RuntimeConfig};
use backend_infrastructure::{
    AppConfig, ChatCompletionAssistant, CsvListingRepository, CsvTransactionRepository,
    DefaultHealthService, FileModelStore,
};

pub struct AppContext {
    pub state: AppState,
}

impl AppContext {
    pub async fn new(config: &AppConfig) -> Result<Self> {
        let runtime_config = config.to_runtime_config();

        let model_store = FileModelStore::new(&runtime_config.valuation_model_path);

        let reference = load_reference(&CsvTransactionRepository::new(), &runtime_config).await?;
        let detector = fit_detector(&reference, runtime_config.detector_params())
            .context("failed to fit anomaly detector")?;
        info!(
            reference_points = reference.len(),
            offset = detector.offset(),
            "anomaly detector fitted"
        );

        let valuation = load_valuation(&CsvListingRepository::new(), &model_store, &runtime_config).await?;

        let state = AppState {
            detector: Arc::new(detector),
            valuation: valuation.map(Arc::new),
            assistant: Arc::new(ChatCompletionAssistant::new(&runtime_config)?),
            health_service: Arc::new(DefaultHealthService::new(&runtime_config)),
            metrics: Arc::new(Metrics::default()),
            config: runtime_config,
        };

        Ok(Self { state })
    }
}

async fn load_reference(repo: &dyn TransactionRepository, config: &RuntimeConfig) -> Result<Vec<FeatureVector>> {
    let Some(path) = &config.reference_data_path else {
        info!("no reference data configured, using built-in baseline");
        return Ok(baseline_reference());
    };
    let batch = repo
        .load_transactions(Path::new(path))
        .await
        .with_context(|| format!("failed to load reference data from {}", path))?;
    if !batch.rejected.is_empty() {
        warn!(rejected = batch.rejected.len(), "reference rows dropped");
    }
    let features: Vec<FeatureVector> = derive_batch(batch.records)?
        .into_iter()
        .map(|(_, features)| features)
        .collect();
    if features.is_empty() {
        return Err(anyhow!("reference data {} has no usable transactions", path));
    }
    Ok(features)
}

/// A stored artifact wins; otherwise the model is trained from
/// `valuation_data_path` when one is configured.
async fn load_valuation(
    listings: &dyn ListingRepository,
    store: &dyn ModelStore,
    config: &RuntimeConfig,
) -> Result<Option<ValuationModel>> {
    if let Some(model) = store.load_valuation_model().await? {
        info!(model_id = %model.model_id, "valuation model loaded");
        return Ok(Some(model));
    }
    let Some(data_path) = &config.valuation_data_path else {
        warn!(
            "no valuation model at {} and no training data configured, valuation disabled",
            config.valuation_model_path
        );
        return Ok(None);
    };
    let model = valuation_commands::train_and_save(
        listings,
        store,
        Path::new(data_path),
        config.valuation_params(),
    )
    .await?;
    Ok(Some(model))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn falls_back_to_baseline_without_reference_or_model() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            valuation_model_path: dir.path().join("land_model.json").to_string_lossy().to_string(),
            ..AppConfig::default()
        };
        let context = AppContext::new(&config).await.unwrap();
        assert!(context.state.detector.is_fitted());
        assert!(context.state.valuation.is_none());
        assert!(!context.state.assistant.is_configured());
    }

    #[tokio::test]
    async fn trains_valuation_when_artifact_missing() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("land_data.csv");
        let mut table =
            String::from("Area_SqFt,Proximity_to_Highway_km,Land_Quality_Rating,Location,Property_Type,Price_INR\n");
        for i in 0..20 {
            let area = 1000 + 100 * i;
            let location = ["Rural", "Urban"][i % 2];
            table.push_str(&format!("{area},{},{},{location},Residential,{}\n", i % 4, i % 10, area * 1500));
        }
        std::fs::write(&data, table).unwrap();

        let model_path = dir.path().join("models/land_model.json");
        let config = AppConfig {
            valuation_model_path: model_path.to_string_lossy().to_string(),
            valuation_data_path: Some(data.to_string_lossy().to_string()),
            valuation_n_estimators: 10,
            ..AppConfig::default()
        };
        let context = AppContext::new(&config).await.unwrap();
        assert!(context.state.valuation.is_some());
        assert!(model_path.exists());
    }

    #[tokio::test]
    async fn missing_reference_file_fails_startup() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            reference_data_path: Some(dir.path().join("absent.csv").to_string_lossy().to_string()),
            valuation_model_path: dir.path().join("land_model.json").to_string_lossy().to_string(),
            ..AppConfig::default()
        };
        assert!(AppContext::new(&config).await.is_err());
    }
}
