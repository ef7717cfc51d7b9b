use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;

use backend_domain::ports::HealthCheckService;
use backend_domain::RuntimeConfig;

/// Ready when the directory holding the valuation artifact exists.
pub struct DefaultHealthService {
    model_dir: PathBuf,
}

impl DefaultHealthService {
    pub fn new(config: &RuntimeConfig) -> Self {
        let model_dir = PathBuf::from(&config.valuation_model_path)
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map(|parent| parent.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));
        Self { model_dir }
    }
}

#[async_trait]
impl HealthCheckService for DefaultHealthService {
    async fn check_model_store(&self) -> anyhow::Result<bool> {
        let metadata = fs::metadata(&self.model_dir).await?;
        Ok(metadata.is_dir())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn existing_model_dir_is_healthy() {
        let dir = tempfile::tempdir().unwrap();
        let config = RuntimeConfig {
            valuation_model_path: dir.path().join("land_model.json").to_string_lossy().to_string(),
            ..RuntimeConfig::default()
        };
        assert!(DefaultHealthService::new(&config).check_model_store().await.unwrap());
    }

    #[tokio::test]
    async fn missing_model_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config = RuntimeConfig {
            valuation_model_path: dir.path().join("nope/land_model.json").to_string_lossy().to_string(),
            ..RuntimeConfig::default()
        };
        assert!(DefaultHealthService::new(&config).check_model_store().await.is_err());
    }
}
