// Runtime configuration handed to the application layer

use serde::{Deserialize, Serialize};

use crate::services::{IsolationForestParams, ValuationParams};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    pub bind_addr: String,
    pub api_token: Option<String>,
    pub max_body_bytes: u64,
    pub request_timeout_seconds: u64,
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

impl RuntimeConfig {
    pub fn detector_params(&self) -> IsolationForestParams {
        IsolationForestParams {
            n_estimators: self.n_estimators,
            max_samples: self.max_samples,
            contamination: self.contamination,
            seed: self.random_seed,
        }
    }

    pub fn valuation_params(&self) -> ValuationParams {
        ValuationParams {
            n_estimators: self.valuation_n_estimators,
            test_fraction: self.valuation_test_fraction,
            seed: self.random_seed,
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:5001".to_string(),
            api_token: None,
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 15,
            contamination: 0.2,
            n_estimators: 100,
            max_samples: None,
            random_seed: 42,
            reference_data_path: None,
            valuation_model_path: "./land_model.json".to_string(),
            valuation_data_path: None,
            valuation_n_estimators: 100,
            valuation_test_fraction: 0.2,
            assistant_api_url: "https://api.groq.com/openai/v1/chat/completions".to_string(),
            assistant_api_key: None,
            assistant_model: "llama3-70b-8192".to_string(),
            assistant_temperature: 0.5,
            assistant_max_tokens: 1024,
        }
    }
}
