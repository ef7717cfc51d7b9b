use std::collections::HashSet;
use std::path::Path;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tracing::debug;

use backend_domain::{ParcelId, RejectedRow, TransactionBatch, TransactionRecord, TransactionRepository};

use crate::utils::{median, parse_date, parse_number, read_table};

const PARCEL_ID: &[&str] = &["parcel id", "parcel_id"];
const TRANSACTION_DATE: &[&str] = &["transaction date", "transaction_date"];
const SALE_PRICE: &[&str] = &["transaction amount", "transaction_amount", "sale price", "sale_price"];
const MARKET_VALUE: &[&str] = &["market value", "market_value"];
const LAND_AREA: &[&str] = &["land area (sq.m)", "land area", "land_area"];

/// Transaction history stored as CSV (optionally gzip compressed).
pub struct CsvTransactionRepository;

impl CsvTransactionRepository {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CsvTransactionRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TransactionRepository for CsvTransactionRepository {
    async fn load_transactions(&self, path: &Path) -> Result<TransactionBatch> {
        let bytes = read_table(path).await?;
        parse_transactions(bytes.as_slice())
    }
}

struct Columns {
    parcel_id: usize,
    date: usize,
    price: usize,
    market_value: usize,
    area: usize,
}

struct RawRow {
    line: u64,
    fields: Vec<String>,
}

impl RawRow {
    fn get(&self, idx: usize) -> &str {
        self.fields.get(idx).map(String::as_str).unwrap_or("")
    }
}

pub(crate) fn find_column(headers: &csv::StringRecord, aliases: &[&str]) -> Result<usize> {
    headers
        .iter()
        .position(|header| {
            let header = header.trim().to_lowercase();
            aliases.iter().any(|alias| header == *alias)
        })
        .ok_or_else(|| anyhow!("missing column '{}'", aliases[0]))
}

/// Cleans a transaction table in a fixed order: exact duplicates go first,
/// missing numeric cells take the column median, then rows with a bad date
/// or a non-positive amount are dropped and reported.
pub fn parse_transactions(input: impl std::io::Read) -> Result<TransactionBatch> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers = reader.headers()?.clone();
    let columns = Columns {
        parcel_id: find_column(&headers, PARCEL_ID)?,
        date: find_column(&headers, TRANSACTION_DATE)?,
        price: find_column(&headers, SALE_PRICE)?,
        market_value: find_column(&headers, MARKET_VALUE)?,
        area: find_column(&headers, LAND_AREA)?,
    };

    let mut seen: HashSet<Vec<String>> = HashSet::new();
    let mut rows = Vec::new();
    let mut duplicates_dropped = 0;
    for result in reader.records() {
        let record = result?;
        let line = record.position().map(|pos| pos.line()).unwrap_or(0);
        let fields: Vec<String> = record.iter().map(str::to_string).collect();
        if !seen.insert(fields.clone()) {
            duplicates_dropped += 1;
            continue;
        }
        rows.push(RawRow { line, fields });
    }

    let column_median = |idx: usize| {
        let values: Vec<f64> = rows.iter().filter_map(|row| parse_number(row.get(idx))).collect();
        median(&values)
    };
    let price_median = column_median(columns.price);
    let value_median = column_median(columns.market_value);
    let area_median = column_median(columns.area);

    let mut records = Vec::with_capacity(rows.len());
    let mut rejected = Vec::new();
    for row in &rows {
        let reject = |reason: String| RejectedRow {
            line: row.line,
            reason,
        };

        let raw_date = row.get(columns.date);
        let Some(date) = parse_date(raw_date) else {
            rejected.push(reject(format!("Invalid transaction date '{raw_date}'")));
            continue;
        };

        let filled = [
            (columns.price, price_median, "sale price"),
            (columns.market_value, value_median, "market value"),
            (columns.area, area_median, "land area"),
        ]
        .map(|(idx, fallback, label)| {
            parse_number(row.get(idx))
                .or(fallback)
                .ok_or_else(|| format!("Invalid {label}"))
        });
        let [price, market_value, area] = match filled {
            [Ok(price), Ok(market_value), Ok(area)] => [price, market_value, area],
            [Err(reason), _, _] | [_, Err(reason), _] | [_, _, Err(reason)] => {
                rejected.push(reject(reason));
                continue;
            }
        };

        match TransactionRecord::new(
            ParcelId::new(row.get(columns.parcel_id)),
            date,
            price,
            market_value,
            area,
        ) {
            Ok(record) => records.push(record),
            Err(err) => rejected.push(reject(err.to_string())),
        }
    }

    debug!(
        kept = records.len(),
        duplicates = duplicates_dropped,
        rejected = rejected.len(),
        "transaction table cleaned"
    );
    Ok(TransactionBatch {
        records,
        duplicates_dropped,
        rejected,
    })
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    const TABLE: &str = "\
Parcel ID,Transaction Date,Transaction Amount,Market Value,Land Area (sq.m)
P1,01/01/2023,300000,290000,100
P1,01/04/2023,320000,300000,100
P1,01/04/2023,320000,300000,100
P2,2023-02-10,,250000,80
P3,not-a-date,100000,100000,50
P4,15/03/2023,-5,100000,50
P5,20/03/2023,200000,210000,0
";

    #[test]
    fn cleans_in_order() {
        let batch = parse_transactions(TABLE.as_bytes()).unwrap();

        assert_eq!(batch.duplicates_dropped, 1);
        assert_eq!(batch.records.len(), 3);
        assert_eq!(
            batch.records[1].transaction_date,
            NaiveDate::from_ymd_opt(2023, 4, 1).unwrap()
        );

        // Median over 300000, 320000, 100000, -5, 200000
        let p2 = &batch.records[2];
        assert_eq!(p2.parcel_id.as_str(), "P2");
        assert_eq!(p2.sale_price, 200000.0);

        let rejected: Vec<(u64, &str)> = batch
            .rejected
            .iter()
            .map(|row| (row.line, row.reason.as_str()))
            .collect();
        assert_eq!(
            rejected,
            vec![
                (6, "Invalid transaction date 'not-a-date'"),
                (7, "Sale price must be positive"),
                (8, "Land area must be positive"),
            ]
        );
    }

    #[test]
    fn snake_case_headers_are_accepted() {
        let table = "parcel_id,transaction_date,sale_price,market_value,land_area\nA,2023-01-01,10,10,1\n";
        let batch = parse_transactions(table.as_bytes()).unwrap();
        assert_eq!(batch.records.len(), 1);
    }

    #[test]
    fn missing_column_is_an_error() {
        let err = parse_transactions("Parcel ID,Transaction Date\nP1,2023-01-01\n".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("transaction amount"));
    }

    #[tokio::test]
    async fn loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("anomaly.csv");
        std::fs::write(&path, TABLE).unwrap();
        let batch = CsvTransactionRepository::new().load_transactions(&path).await.unwrap();
        assert_eq!(batch.records.len(), 3);
    }
}
