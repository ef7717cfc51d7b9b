// Domain entities

pub mod anomaly;
pub mod assistant;
pub mod dataset;
pub mod features;
pub mod runtime_config;
pub mod schema;
pub mod transaction;
pub mod valuation;

pub use anomaly::*;
pub use assistant::*;
pub use dataset::*;
pub use features::*;
pub use runtime_config::*;
pub use schema::*;
pub use transaction::*;
pub use valuation::*;
