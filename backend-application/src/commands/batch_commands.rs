use std::path::Path;

use tracing::{info, warn};

use backend_domain::ports::TransactionRepository;
use backend_domain::services::{detect_batch, IsolationForestParams};
use backend_domain::DomainError;

use crate::dtos::{BatchDetectionReport, FlaggedTransaction};
use crate::AppError;

/// Loads a transaction history and runs fit-predict over it.
///
/// The detector is fit on the batch itself. Flagged rows keep derivation
/// order (parcel, then date). A file with too few usable rows is the
/// caller's fault; bad detector settings are not.
pub async fn run_batch_detection(
    repo: &dyn TransactionRepository,
    path: &Path,
    params: IsolationForestParams,
) -> Result<BatchDetectionReport, AppError> {
    let batch = repo.load_transactions(path).await?;
    for row in &batch.rejected {
        warn!(line = row.line, "dropped row: {}", row.reason);
    }
    info!(
        path = %path.display(),
        records = batch.records.len(),
        duplicates = batch.duplicates_dropped,
        rejected = batch.rejected.len(),
        "transactions loaded"
    );

    let records = batch.records;
    let (_, scored) = tokio::task::spawn_blocking(move || detect_batch(records, params))
        .await
        .map_err(|err| AppError::Internal(err.into()))?
        .map_err(|err| match err {
            DomainError::InsufficientData { .. } => AppError::BadRequest(format!("batch detection failed: {err}")),
            other => AppError::from(other),
        })?;

    let flagged: Vec<FlaggedTransaction> = scored
        .iter()
        .filter(|s| s.verdict.is_anomaly())
        .map(FlaggedTransaction::from)
        .collect();
    let total = scored.len();
    let anomalies = flagged.len();
    info!(total, anomalies, "batch detection finished");

    Ok(BatchDetectionReport {
        total,
        anomalies,
        anomaly_fraction: if total == 0 { 0.0 } else { anomalies as f64 / total as f64 },
        duplicates_dropped: batch.duplicates_dropped,
        rejected: batch.rejected,
        flagged,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeTransactions;
    use backend_domain::{ParcelId, RejectedRow, TransactionBatch, TransactionRecord};
    use chrono::NaiveDate;

    fn history() -> TransactionBatch {
        let mut records = Vec::new();
        for i in 0..20u32 {
            let price = if i == 7 { 4_000_000.0 } else { 300_000.0 + 1_000.0 * i as f64 };
            records.push(
                TransactionRecord::new(
                    ParcelId::new(format!("P{:02}", i % 10)),
                    NaiveDate::from_ymd_opt(2022 + (i / 10) as i32, 3, 1).unwrap(),
                    price,
                    300_000.0,
                    100.0,
                )
                .unwrap(),
            );
        }
        TransactionBatch {
            records,
            duplicates_dropped: 1,
            rejected: vec![RejectedRow {
                line: 4,
                reason: "Land area must be positive".to_string(),
            }],
        }
    }

    #[tokio::test]
    async fn reports_contamination_share_of_batch() {
        let repo = FakeTransactions(history());
        let report = run_batch_detection(&repo, Path::new("history.csv"), IsolationForestParams::default())
            .await
            .unwrap();

        assert_eq!(report.total, 20);
        assert_eq!(report.duplicates_dropped, 1);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.anomalies, report.flagged.len());
        assert!(report.anomalies >= 1 && report.anomalies <= 5);
        assert!(report
            .flagged
            .iter()
            .any(|row| row.parcel_id == "P07" && row.transaction_date.to_string() == "2022-03-01"));

        let mut keys: Vec<(String, NaiveDate)> = report
            .flagged
            .iter()
            .map(|row| (row.parcel_id.clone(), row.transaction_date))
            .collect();
        let order = keys.clone();
        keys.sort();
        assert_eq!(keys, order);
    }

    #[tokio::test]
    async fn too_small_batch_is_a_bad_request() {
        let mut batch = history();
        batch.records.truncate(3);
        let repo = FakeTransactions(batch);
        let err = run_batch_detection(&repo, Path::new("small.csv"), IsolationForestParams::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn bad_detector_settings_are_internal() {
        let repo = FakeTransactions(history());
        let params = IsolationForestParams {
            contamination: 0.9,
            ..IsolationForestParams::default()
        };
        let err = run_batch_detection(&repo, Path::new("history.csv"), params)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }
}
