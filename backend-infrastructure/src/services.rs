pub mod assistant_service;
pub mod health_service;

pub use assistant_service::*;
pub use health_service::*;
