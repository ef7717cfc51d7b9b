pub mod csv_listings;
pub mod csv_transactions;
pub mod model_store;

pub use csv_listings::*;
pub use csv_transactions::*;
pub use model_store::*;
