// Assistant entity
// Answer returned by the registration assistant

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistantReply {
    pub answer: String,
    pub model: String,
}
