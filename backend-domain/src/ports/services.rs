use async_trait::async_trait;

use crate::entities::AssistantReply;

#[async_trait]
pub trait RegistrationAssistant: Send + Sync {
    fn is_configured(&self) -> bool;
    async fn ask(&self, question: &str) -> anyhow::Result<AssistantReply>;
}

#[async_trait]
pub trait HealthCheckService: Send + Sync {
    async fn check_model_store(&self) -> anyhow::Result<bool>;
}
