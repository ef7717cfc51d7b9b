// Loaded datasets
// Cleaned rows plus the rows that were excluded and why

use serde::{Deserialize, Serialize};

use crate::entities::{LabeledListing, TransactionRecord};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedRow {
    /// 1-based line number in the source file, header included.
    pub line: u64,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct TransactionBatch {
    pub records: Vec<TransactionRecord>,
    pub duplicates_dropped: usize,
    pub rejected: Vec<RejectedRow>,
}

#[derive(Debug, Clone, Default)]
pub struct ListingBatch {
    pub listings: Vec<LabeledListing>,
    pub rejected: Vec<RejectedRow>,
}
