pub mod anomaly_commands;
pub mod assistant_commands;
pub mod batch_commands;
pub mod valuation_commands;
