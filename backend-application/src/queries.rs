pub mod health_queries;
pub mod model_queries;
