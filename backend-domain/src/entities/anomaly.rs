// Anomaly entity
// Detector verdict attached to a feature vector; recomputed per batch or request

use serde::{Deserialize, Serialize};

use crate::entities::{FeatureVector, TransactionRecord};
use crate::value_objects::RiskLevel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnomalyLabel {
    Normal,
    Anomalous,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnomalyScore {
    pub label: AnomalyLabel,
    /// Decision value; negative means anomalous, lower is more anomalous.
    pub score: f64,
}

impl AnomalyScore {
    pub fn from_decision(score: f64) -> Self {
        let label = if score < 0.0 {
            AnomalyLabel::Anomalous
        } else {
            AnomalyLabel::Normal
        };
        Self { label, score }
    }

    pub fn is_anomaly(&self) -> bool {
        self.label == AnomalyLabel::Anomalous
    }

    pub fn risk_level(&self) -> RiskLevel {
        RiskLevel::from_anomaly(self.is_anomaly())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredTransaction {
    pub record: TransactionRecord,
    pub features: FeatureVector,
    pub verdict: AnomalyScore,
}
