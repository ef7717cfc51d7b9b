use std::path::Path;

use async_trait::async_trait;

use crate::entities::{ListingBatch, TransactionBatch};
use crate::services::ValuationModel;

#[async_trait]
pub trait TransactionRepository: Send + Sync {
    /// Loads and cleans a transaction history; excluded rows are reported,
    /// not fatal.
    async fn load_transactions(&self, path: &Path) -> anyhow::Result<TransactionBatch>;
}

#[async_trait]
pub trait ListingRepository: Send + Sync {
    async fn load_listings(&self, path: &Path) -> anyhow::Result<ListingBatch>;
}

#[async_trait]
pub trait ModelStore: Send + Sync {
    /// `Ok(None)` when no artifact exists yet. A present but invalid
    /// artifact is an error.
    async fn load_valuation_model(&self) -> anyhow::Result<Option<ValuationModel>>;
    async fn save_valuation_model(&self, model: &ValuationModel) -> anyhow::Result<()>;
}
