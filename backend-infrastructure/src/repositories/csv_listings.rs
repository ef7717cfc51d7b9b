use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;

use backend_domain::{
    LabeledListing, LandListing, ListingBatch, ListingRepository, RejectedRow, AREA_COLUMN, HIGHWAY_COLUMN,
    LOCATION_FIELD, PROPERTY_TYPE_FIELD, QUALITY_COLUMN,
};

use super::csv_transactions::find_column;
use crate::utils::{parse_number, read_table};

pub const PRICE_COLUMN: &str = "Price_INR";

/// Labelled land listings for training the valuation model.
pub struct CsvListingRepository;

impl CsvListingRepository {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CsvListingRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ListingRepository for CsvListingRepository {
    async fn load_listings(&self, path: &Path) -> Result<ListingBatch> {
        let bytes = read_table(path).await?;
        parse_listings(bytes.as_slice())
    }
}

pub fn parse_listings(input: impl std::io::Read) -> Result<ListingBatch> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers = reader.headers()?.clone();
    let column = |name: &str| find_column(&headers, &[name.to_lowercase().as_str()]);
    let area_idx = column(AREA_COLUMN)?;
    let highway_idx = column(HIGHWAY_COLUMN)?;
    let quality_idx = column(QUALITY_COLUMN)?;
    let location_idx = column(LOCATION_FIELD)?;
    let property_type_idx = column(PROPERTY_TYPE_FIELD)?;
    let price_idx = column(PRICE_COLUMN)?;

    let mut batch = ListingBatch::default();
    for result in reader.records() {
        let record = result?;
        let line = record.position().map(|pos| pos.line()).unwrap_or(0);
        let field = |idx: usize| record.get(idx).unwrap_or("");
        let number = |idx: usize, name: &str| {
            parse_number(field(idx)).ok_or_else(|| format!("Invalid {name} '{}'", field(idx)))
        };

        let parsed = (|| -> Result<LabeledListing, String> {
            let listing = LandListing::new(
                number(area_idx, AREA_COLUMN)?,
                number(highway_idx, HIGHWAY_COLUMN)?,
                number(quality_idx, QUALITY_COLUMN)?,
                field(location_idx),
                field(property_type_idx),
            )
            .map_err(|err| err.to_string())?;
            let price = number(price_idx, PRICE_COLUMN)?;
            if price <= 0.0 {
                return Err(format!("{PRICE_COLUMN} must be positive"));
            }
            Ok(LabeledListing { listing, price })
        })();

        match parsed {
            Ok(listing) => batch.listings.push(listing),
            Err(reason) => batch.rejected.push(RejectedRow { line, reason }),
        }
    }
    Ok(batch)
}
