// Request and response shapes shared by the HTTP layer and the CLI

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use backend_domain::{
    FeatureImportance, RegressionMetrics, RejectedRow, RiskLevel, ScoredTransaction,
};

/// A raw field as submitted: JSON numbers stay numbers, form fields and
/// quoted JSON values arrive as text. Any other JSON value is kept so the
/// field can be reported as invalid by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

impl FieldValue {
    pub fn to_text(&self) -> String {
        match self {
            FieldValue::Number(value) => value.to_string(),
            FieldValue::Text(value) => value.trim().to_string(),
            FieldValue::Other(value) => value.to_string(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionCheckRequest {
    pub parcel_id: Option<FieldValue>,
    pub transaction_date: Option<FieldValue>,
    pub sale_price: Option<FieldValue>,
    pub market_value: Option<FieldValue>,
    pub land_area: Option<FieldValue>,
    pub days_since_prev: Option<FieldValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionCheckResponse {
    pub risk_level: RiskLevel,
    pub parcel_id: Option<String>,
    pub transaction_date: NaiveDate,
    pub price_per_sqm: f64,
    pub price_ratio: f64,
    pub days_since_prev: i64,
    pub anomaly_score: f64,
    pub is_anomaly: bool,
}

impl From<&ScoredTransaction> for TransactionCheckResponse {
    fn from(scored: &ScoredTransaction) -> Self {
        let parcel_id = scored.record.parcel_id.as_str();
        Self {
            risk_level: scored.verdict.risk_level(),
            parcel_id: (!parcel_id.is_empty()).then(|| parcel_id.to_string()),
            transaction_date: scored.record.transaction_date,
            price_per_sqm: round2(scored.features.price_per_sqm),
            price_ratio: round2(scored.features.price_ratio),
            days_since_prev: scored.features.days_since_prev,
            anomaly_score: scored.verdict.score,
            is_anomaly: scored.verdict.is_anomaly(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchDetectionReport {
    pub total: usize,
    pub anomalies: usize,
    pub anomaly_fraction: f64,
    pub duplicates_dropped: usize,
    pub rejected: Vec<RejectedRow>,
    pub flagged: Vec<FlaggedTransaction>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FlaggedTransaction {
    pub parcel_id: String,
    pub transaction_date: NaiveDate,
    pub price_per_sqm: f64,
    pub price_ratio: f64,
    pub days_since_prev: i64,
    pub anomaly_score: f64,
}

impl From<&ScoredTransaction> for FlaggedTransaction {
    fn from(scored: &ScoredTransaction) -> Self {
        Self {
            parcel_id: scored.record.parcel_id.to_string(),
            transaction_date: scored.record.transaction_date,
            price_per_sqm: scored.features.price_per_sqm,
            price_ratio: scored.features.price_ratio,
            days_since_prev: scored.features.days_since_prev,
            anomaly_score: scored.verdict.score,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValuationRequest {
    pub area_sqft: FieldValue,
    pub proximity_to_highway_km: FieldValue,
    pub land_quality_rating: FieldValue,
    pub location: String,
    pub property_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValuationResponse {
    pub predicted_price: f64,
    pub model_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValuationModelInfo {
    pub model_id: String,
    pub trained_at: DateTime<Utc>,
    pub schema_version: u32,
    pub schema_fingerprint: String,
    pub features: Vec<String>,
    pub metrics: RegressionMetrics,
    pub importances: Vec<FeatureImportance>,
    pub locations: Vec<String>,
    pub property_types: Vec<String>,
    pub n_train: usize,
    pub n_test: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DetectorInfo {
    pub features: Vec<&'static str>,
    pub n_estimators: usize,
    pub contamination: f64,
    pub offset: f64,
    pub random_seed: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantQuestion {
    pub question: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReadinessReport {
    pub detector_fitted: bool,
    pub valuation_loaded: bool,
    pub assistant_configured: bool,
    pub model_store_ok: bool,
}

impl ReadinessReport {
    /// The valuation model and the assistant are optional; only the
    /// detector and the model store gate readiness.
    pub fn is_ready(&self) -> bool {
        self.detector_fitted && self.model_store_ok
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
