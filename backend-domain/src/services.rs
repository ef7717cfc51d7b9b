// Domain services: pure feature engineering and model fitting

pub mod decision_tree;
pub mod detection;
pub mod evaluation;
pub mod features;
pub mod isolation_forest;
pub mod random_forest;
pub mod valuation;

pub use decision_tree::*;
pub use detection::*;
pub use evaluation::*;
pub use features::*;
pub use isolation_forest::*;
pub use random_forest::*;
pub use valuation::*;
