use std::env;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use tokio::fs;
use tracing::warn;

use backend_domain::RuntimeConfig;

use super::validation::{validate_contamination, validate_fraction};

pub const CONFIG_ENV: &str = "LANDREC_CONFIG";

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub bind_addr: String,
    pub api_token: Option<String>,
    pub max_body_bytes: u64,
    pub request_timeout_seconds: u64,
    pub log_dir: Option<String>,
    pub contamination: f64,
    pub n_estimators: usize,
    pub max_samples: Option<usize>,
    pub random_seed: u64,
    pub reference_data_path: Option<String>,
    pub valuation_model_path: String,
    pub valuation_data_path: Option<String>,
    pub valuation_n_estimators: usize,
    pub valuation_test_fraction: f64,
    pub assistant_api_url: String,
    pub assistant_api_key: Option<String>,
    pub assistant_model: String,
    pub assistant_temperature: f32,
    pub assistant_max_tokens: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        let runtime = RuntimeConfig::default();
        Self {
            bind_addr: runtime.bind_addr,
            api_token: runtime.api_token,
            max_body_bytes: runtime.max_body_bytes,
            request_timeout_seconds: runtime.request_timeout_seconds,
            log_dir: None,
            contamination: runtime.contamination,
            n_estimators: runtime.n_estimators,
            max_samples: runtime.max_samples,
            random_seed: runtime.random_seed,
            reference_data_path: runtime.reference_data_path,
            valuation_model_path: runtime.valuation_model_path,
            valuation_data_path: runtime.valuation_data_path,
            valuation_n_estimators: runtime.valuation_n_estimators,
            valuation_test_fraction: runtime.valuation_test_fraction,
            assistant_api_url: runtime.assistant_api_url,
            assistant_api_key: runtime.assistant_api_key,
            assistant_model: runtime.assistant_model,
            assistant_temperature: runtime.assistant_temperature,
            assistant_max_tokens: runtime.assistant_max_tokens,
        }
    }
}

impl AppConfig {
    pub async fn load() -> Result<Self> {
        let path = env::var(CONFIG_ENV).unwrap_or_else(|_| "./config.toml".to_string());
        Self::load_from(Path::new(&path), |key| env::var(key).ok()).await
    }

    /// Reads `file_path` (defaults when absent), then applies overrides
    /// looked up through `lookup`.
    pub async fn load_from(file_path: &Path, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let base_dir = file_path.parent();
        let mut config = if file_path.exists() {
            let content = fs::read_to_string(file_path)
                .await
                .with_context(|| format!("failed to read {}", file_path.display()))?;
            toml::from_str(&content).with_context(|| format!("failed to parse {}", file_path.display()))?
        } else {
            warn!("{} not found, using defaults", file_path.display());
            AppConfig::default()
        };
        config.apply_overrides(lookup);
        config.normalize();
        config.resolve_paths(base_dir);
        config.validate()?;
        Ok(config)
    }

    pub fn normalize(&mut self) {
        for value in [
            &mut self.api_token,
            &mut self.log_dir,
            &mut self.reference_data_path,
            &mut self.valuation_data_path,
            &mut self.assistant_api_key,
        ] {
            if value.as_ref().is_some_and(|v| v.trim().is_empty()) {
                *value = None;
            }
        }
        if self.max_samples == Some(0) {
            self.max_samples = None;
        }
    }

    fn resolve_paths(&mut self, base_dir: Option<&Path>) {
        let Some(base) = base_dir else {
            return;
        };
        self.valuation_model_path = resolve_path(base, &self.valuation_model_path);
        for value in [
            &mut self.log_dir,
            &mut self.reference_data_path,
            &mut self.valuation_data_path,
        ] {
            if let Some(path) = value.as_mut() {
                *path = resolve_path(base, path);
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.bind_addr
            .parse::<std::net::SocketAddr>()
            .map_err(|err| anyhow!("invalid bind_addr: {}", err))?;
        if self.max_body_bytes == 0 {
            return Err(anyhow!("max_body_bytes must be greater than 0"));
        }
        validate_contamination(self.contamination)?;
        if self.n_estimators == 0 || self.valuation_n_estimators == 0 {
            return Err(anyhow!("n_estimators must be greater than 0"));
        }
        validate_fraction("valuation_test_fraction", self.valuation_test_fraction)?;
        if self.valuation_model_path.trim().is_empty() {
            return Err(anyhow!("valuation_model_path must not be empty"));
        }
        if !(0.0..=2.0).contains(&self.assistant_temperature) {
            return Err(anyhow!("assistant_temperature must be in [0, 2]"));
        }
        if self.assistant_max_tokens == 0 {
            return Err(anyhow!("assistant_max_tokens must be greater than 0"));
        }
        Ok(())
    }

    pub fn to_runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            bind_addr: self.bind_addr.clone(),
            api_token: self.api_token.clone(),
            max_body_bytes: self.max_body_bytes,
            request_timeout_seconds: self.request_timeout_seconds,
            contamination: self.contamination,
            n_estimators: self.n_estimators,
            max_samples: self.max_samples,
            random_seed: self.random_seed,
            reference_data_path: self.reference_data_path.clone(),
            valuation_model_path: self.valuation_model_path.clone(),
            valuation_data_path: self.valuation_data_path.clone(),
            valuation_n_estimators: self.valuation_n_estimators,
            valuation_test_fraction: self.valuation_test_fraction,
            assistant_api_url: self.assistant_api_url.clone(),
            assistant_api_key: self.assistant_api_key.clone(),
            assistant_model: self.assistant_model.clone(),
            assistant_temperature: self.assistant_temperature,
            assistant_max_tokens: self.assistant_max_tokens,
        }
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(value) = lookup("LANDREC_BIND_ADDR") {
            self.bind_addr = value;
        }
        if let Some(value) = lookup("LANDREC_API_TOKEN") {
            self.api_token = Some(value);
        }
        if let Some(value) = lookup("LANDREC_MAX_BODY_BYTES") {
            self.max_body_bytes = value.parse().unwrap_or(self.max_body_bytes);
        }
        if let Some(value) = lookup("LANDREC_REQUEST_TIMEOUT_SECONDS") {
            self.request_timeout_seconds = value.parse().unwrap_or(self.request_timeout_seconds);
        }
        if let Some(value) = lookup("LANDREC_LOG_DIR") {
            self.log_dir = Some(value);
        }
        if let Some(value) = lookup("LANDREC_CONTAMINATION") {
            self.contamination = value.parse().unwrap_or(self.contamination);
        }
        if let Some(value) = lookup("LANDREC_N_ESTIMATORS") {
            self.n_estimators = value.parse().unwrap_or(self.n_estimators);
        }
        if let Some(value) = lookup("LANDREC_MAX_SAMPLES") {
            self.max_samples = value.parse().ok();
        }
        if let Some(value) = lookup("LANDREC_RANDOM_SEED") {
            self.random_seed = value.parse().unwrap_or(self.random_seed);
        }
        if let Some(value) = lookup("LANDREC_REFERENCE_DATA_PATH") {
            self.reference_data_path = Some(value);
        }
        if let Some(value) = lookup("LANDREC_VALUATION_MODEL_PATH") {
            self.valuation_model_path = value;
        }
        if let Some(value) = lookup("LANDREC_VALUATION_DATA_PATH") {
            self.valuation_data_path = Some(value);
        }
        if let Some(value) = lookup("LANDREC_VALUATION_N_ESTIMATORS") {
            self.valuation_n_estimators = value.parse().unwrap_or(self.valuation_n_estimators);
        }
        if let Some(value) = lookup("LANDREC_VALUATION_TEST_FRACTION") {
            self.valuation_test_fraction = value.parse().unwrap_or(self.valuation_test_fraction);
        }
        if let Some(value) = lookup("LANDREC_ASSISTANT_API_URL") {
            self.assistant_api_url = value;
        }
        if let Some(value) = lookup("LANDREC_ASSISTANT_API_KEY") {
            self.assistant_api_key = Some(value);
        }
        if self.assistant_api_key.is_none() {
            self.assistant_api_key = lookup("GROQ_API_KEY");
        }
        if let Some(value) = lookup("LANDREC_ASSISTANT_MODEL") {
            self.assistant_model = value;
        }
        if let Some(value) = lookup("LANDREC_ASSISTANT_TEMPERATURE") {
            self.assistant_temperature = value.parse().unwrap_or(self.assistant_temperature);
        }
        if let Some(value) = lookup("LANDREC_ASSISTANT_MAX_TOKENS") {
            self.assistant_max_tokens = value.parse().unwrap_or(self.assistant_max_tokens);
        }
    }
}

fn resolve_path(base: &Path, value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return trimmed.to_string();
    }
    let path = Path::new(trimmed);
    if path.is_absolute() {
        trimmed.to_string()
    } else {
        base.join(path).to_string_lossy().to_string()
    }
}
