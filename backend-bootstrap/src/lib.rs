pub mod batch;
pub mod context;
pub mod lifecycle;
pub mod logging;

pub use batch::{run_detect, run_train_valuation};
pub use lifecycle::run_server;
