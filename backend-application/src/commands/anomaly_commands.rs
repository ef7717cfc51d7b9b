use chrono::NaiveDate;
use tracing::{info, warn};

use backend_domain::services::{derive_features, score_features};
use backend_domain::{
    require_positive, DomainError, DomainResult, ParcelId, ScoredTransaction, TransactionRecord,
};

use crate::dtos::{FieldValue, TransactionCheckRequest};
use crate::{AppError, AppState};

/// Validates one submitted transaction and scores it against the
/// process-wide detector.
pub async fn check_transaction(
    state: &AppState,
    request: &TransactionCheckRequest,
) -> Result<ScoredTransaction, AppError> {
    let outcome = score_request(state, request);
    match &outcome {
        Ok(scored) => {
            state.metrics.record_check(scored.verdict.is_anomaly());
            info!(
                parcel_id = %scored.record.parcel_id,
                score = scored.verdict.score,
                is_anomaly = scored.verdict.is_anomaly(),
                "transaction checked"
            );
        }
        Err(AppError::BadRequest(message)) => {
            state.metrics.record_rejected();
            warn!("transaction rejected: {}", message);
        }
        Err(_) => {}
    }
    outcome
}

fn score_request(state: &AppState, request: &TransactionCheckRequest) -> Result<ScoredTransaction, AppError> {
    let (record, days_since_prev) = parse_check_request(request)?;
    let features = derive_features(&record, days_since_prev)?;
    let verdict = score_features(&state.detector, &[features])?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("detector returned no score")))?;
    Ok(ScoredTransaction {
        record,
        features,
        verdict,
    })
}

/// Field checks run in form order so the first bad field is the one
/// reported.
pub fn parse_check_request(request: &TransactionCheckRequest) -> DomainResult<(TransactionRecord, i64)> {
    let transaction_date = parse_date(request.transaction_date.as_ref())?;
    let sale_price = parse_positive(request.sale_price.as_ref(), "sale_price", "Sale price")?;
    let market_value = parse_positive(request.market_value.as_ref(), "market_value", "Market value")?;
    let land_area = parse_positive(request.land_area.as_ref(), "land_area", "Land area")?;
    let days_since_prev = parse_days(request.days_since_prev.as_ref())?;

    let parcel_id = ParcelId::new(
        request
            .parcel_id
            .as_ref()
            .map(FieldValue::to_text)
            .unwrap_or_default(),
    );
    let record = TransactionRecord::new(parcel_id, transaction_date, sale_price, market_value, land_area)?;
    Ok((record, days_since_prev))
}

fn parse_date(raw: Option<&FieldValue>) -> DomainResult<NaiveDate> {
    let text = raw.map(FieldValue::to_text).unwrap_or_default();
    if text.is_empty() {
        return Err(DomainError::validation(
            "transaction_date",
            "Transaction date is required",
        ));
    }
    NaiveDate::parse_from_str(&text, "%Y-%m-%d").map_err(|_| {
        DomainError::validation(
            "transaction_date",
            format!("Invalid transaction date '{text}', expected YYYY-MM-DD"),
        )
    })
}

pub(crate) fn parse_number(raw: Option<&FieldValue>, field: &'static str, label: &str) -> DomainResult<f64> {
    let invalid = || DomainError::validation(field, format!("Invalid {}", label.to_lowercase()));
    match raw {
        Some(FieldValue::Number(value)) => Ok(*value),
        Some(FieldValue::Text(text)) => text.trim().parse::<f64>().map_err(|_| invalid()),
        Some(FieldValue::Other(_)) | None => Err(invalid()),
    }
}

fn parse_positive(raw: Option<&FieldValue>, field: &'static str, label: &str) -> DomainResult<f64> {
    require_positive(field, label, parse_number(raw, field, label)?)
}

/// Absent or blank means no earlier sale is known. Anything else must be a
/// non-negative day count; fractional days are truncated.
fn parse_days(raw: Option<&FieldValue>) -> DomainResult<i64> {
    let invalid = || {
        DomainError::validation(
            "days_since_prev",
            "Invalid days since previous transaction",
        )
    };
    let value = match raw {
        None => return Ok(0),
        Some(FieldValue::Text(text)) if text.trim().is_empty() => return Ok(0),
        Some(FieldValue::Text(text)) => text.trim().parse::<f64>().map_err(|_| invalid())?,
        Some(FieldValue::Number(value)) => *value,
        Some(FieldValue::Other(_)) => return Err(invalid()),
    };
    if !value.is_finite() || value < 0.0 {
        return Err(invalid());
    }
    Ok(value.trunc() as i64)
}
