pub mod anomaly_handlers;
pub mod assistant_handlers;
pub mod ops_handlers;
pub mod page_handlers;
pub mod valuation_handlers;

pub use anomaly_handlers::*;
pub use assistant_handlers::*;
pub use ops_handlers::*;
pub use page_handlers::*;
pub use valuation_handlers::*;
