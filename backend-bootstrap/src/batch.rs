use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};

use backend_application::commands::{batch_commands, valuation_commands};
use backend_application::dtos::BatchDetectionReport;
use backend_domain::services::ValuationModel;
use backend_infrastructure::{AppConfig, CsvListingRepository, CsvTransactionRepository, FileModelStore};

pub async fn run_detect(config: &AppConfig, input: Option<PathBuf>, limit: usize) -> Result<()> {
    let path = input
        .or_else(|| config.reference_data_path.as_ref().map(PathBuf::from))
        .ok_or_else(|| anyhow!("no input given and reference_data_path is not configured"))?;
    let runtime_config = config.to_runtime_config();
    let report = batch_commands::run_batch_detection(
        &CsvTransactionRepository::new(),
        &path,
        runtime_config.detector_params(),
    )
    .await?;
    print!("{}", render_report(&report, limit));
    Ok(())
}

pub async fn run_train_valuation(
    config: &AppConfig,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<()> {
    let input = input
        .or_else(|| config.valuation_data_path.as_ref().map(PathBuf::from))
        .ok_or_else(|| anyhow!("no input given and valuation_data_path is not configured"))?;
    let output = output.unwrap_or_else(|| PathBuf::from(&config.valuation_model_path));
    let runtime_config = config.to_runtime_config();

    let model = valuation_commands::train_and_save(
        &CsvListingRepository::new(),
        &FileModelStore::new(&output),
        &input,
        runtime_config.valuation_params(),
    )
    .await?;
    print!("{}", render_training(&model, &output));
    Ok(())
}

pub fn render_report(report: &BatchDetectionReport, limit: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Found {} anomalies out of {} transactions ({:.1}%)",
        report.anomalies,
        report.total,
        report.anomaly_fraction * 100.0
    );
    if report.duplicates_dropped > 0 || !report.rejected.is_empty() {
        let _ = writeln!(
            out,
            "Dropped {} duplicate and {} invalid rows",
            report.duplicates_dropped,
            report.rejected.len()
        );
    }
    if report.flagged.is_empty() {
        return out;
    }

    let _ = writeln!(out, "\nTop suspicious transactions:");
    let _ = writeln!(
        out,
        "{:<12} {:<10} {:>14} {:>11} {:>15} {:>13}",
        "parcel_id", "date", "price_per_sqm", "price_ratio", "days_since_prev", "anomaly_score"
    );
    for row in report.flagged.iter().take(limit) {
        let _ = writeln!(
            out,
            "{:<12} {:<10} {:>14.2} {:>11.2} {:>15} {:>13.4}",
            row.parcel_id,
            row.transaction_date.format("%Y-%m-%d"),
            row.price_per_sqm,
            row.price_ratio,
            row.days_since_prev,
            row.anomaly_score
        );
    }
    out
}

fn render_training(model: &ValuationModel, output: &Path) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Model {} saved to {}", model.model_id, output.display());
    let _ = writeln!(
        out,
        "Trained on {} listings, evaluated on {}",
        model.n_train, model.n_test
    );
    let _ = writeln!(out, "Mean Absolute Error: {:.2}", model.metrics.mae);
    let _ = writeln!(out, "Root Mean Squared Error: {:.2}", model.metrics.rmse);
    let _ = writeln!(out, "R² Score: {:.4}", model.metrics.r2);
    let _ = writeln!(out, "\nFeature Importance:");
    for item in &model.importances {
        let _ = writeln!(out, "{:<28} {:.4}", item.feature, item.importance);
    }
    out
}

#[cfg(test)]
mod tests {
    use backend_application::dtos::FlaggedTransaction;
    use backend_domain::RejectedRow;

    use super::*;

    fn flagged(parcel: &str, score: f64) -> FlaggedTransaction {
        FlaggedTransaction {
            parcel_id: parcel.to_string(),
            transaction_date: "2023-04-01".parse().unwrap(),
            price_per_sqm: 29000.0,
            price_ratio: 9.666_7,
            days_since_prev: 90,
            anomaly_score: score,
        }
    }

    #[test]
    fn summary_and_limited_rows() {
        let report = BatchDetectionReport {
            total: 20,
            anomalies: 3,
            anomaly_fraction: 0.15,
            duplicates_dropped: 1,
            rejected: vec![RejectedRow {
                line: 4,
                reason: "Sale price must be positive".to_string(),
            }],
            flagged: vec![flagged("P1", -0.21), flagged("P2", -0.05), flagged("P3", -0.01)],
        };
        let text = render_report(&report, 2);
        assert!(text.starts_with("Found 3 anomalies out of 20 transactions (15.0%)\n"));
        assert!(text.contains("Dropped 1 duplicate and 1 invalid rows"));
        assert!(text.contains("P1"));
        assert!(text.contains("P2"));
        assert!(!text.contains("P3"));
        assert!(text.contains("9.67"));
    }

    #[test]
    fn no_table_without_anomalies() {
        let report = BatchDetectionReport {
            total: 5,
            anomalies: 0,
            anomaly_fraction: 0.0,
            duplicates_dropped: 0,
            rejected: Vec::new(),
            flagged: Vec::new(),
        };
        assert_eq!(
            render_report(&report, 10),
            "Found 0 anomalies out of 5 transactions (0.0%)\n"
        );
    }

    #[tokio::test]
    async fn detect_needs_an_input() {
        let err = run_detect(&AppConfig::default(), None, 10).await.unwrap_err();
        assert!(err.to_string().contains("reference_data_path"));
    }
}
