use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::fs;
use tracing::info;

use backend_domain::services::ValuationModel;
use backend_domain::ModelStore;

/// Valuation model persisted as a single JSON artifact.
pub struct FileModelStore {
    path: PathBuf,
}

impl FileModelStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ModelStore for FileModelStore {
    async fn load_valuation_model(&self) -> Result<Option<ValuationModel>> {
        if !fs::try_exists(&self.path).await.unwrap_or(false) {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        let model: ValuationModel = serde_json::from_str(&content)
            .with_context(|| format!("malformed model artifact {}", self.path.display()))?;
        model
            .validate()
            .with_context(|| format!("rejected model artifact {}", self.path.display()))?;
        info!(model_id = %model.model_id, path = %self.path.display(), "valuation model loaded");
        Ok(Some(model))
    }

    async fn save_valuation_model(&self, model: &ValuationModel) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let content = serde_json::to_vec_pretty(model)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, content).await?;
        fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        Ok(())
    }
}
