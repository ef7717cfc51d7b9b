use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use backend_domain::ports::RegistrationAssistant;
use backend_domain::{AssistantReply, RuntimeConfig};

pub const SYSTEM_PROMPT: &str = "You are a specialized assistant focused STRICTLY on land registration \
documents and processes. You ONLY help people understand and prepare documents for land registration. \
Explain land registration processes in simple language and provide step-by-step guidance. Be empathetic and \
helpful, but REFUSE to answer any questions not directly related to land registration, land ownership \
documentation, or the specific paperwork required for land transactions. If asked about anything else, \
politely redirect the conversation back to land registration topics. Your purpose is exclusively to provide \
accessible information about land rights and registration documents.";

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    model: Option<String>,
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Registration assistant backed by an OpenAI-compatible chat-completions
/// endpoint (Groq by default).
pub struct ChatCompletionAssistant {
    client: Client,
    api_url: String,
    api_key: Option<String>,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl ChatCompletionAssistant {
    pub fn new(config: &RuntimeConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds.max(3)))
            .build()?;
        Ok(Self {
            client,
            api_url: config.assistant_api_url.clone(),
            api_key: config.assistant_api_key.clone(),
            model: config.assistant_model.clone(),
            temperature: config.assistant_temperature,
            max_tokens: config.assistant_max_tokens,
        })
    }

    fn request<'a>(&'a self, question: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: question,
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stream: false,
        }
    }
}

fn extract_reply(response: ChatResponse, fallback_model: &str) -> Result<AssistantReply> {
    let answer = response
        .choices
        .into_iter()
        .filter_map(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .find(|content| !content.is_empty())
        .ok_or_else(|| anyhow!("assistant returned an empty completion"))?;
    Ok(AssistantReply {
        answer,
        model: response.model.unwrap_or_else(|| fallback_model.to_string()),
    })
}

#[async_trait]
impl RegistrationAssistant for ChatCompletionAssistant {
    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn ask(&self, question: &str) -> Result<AssistantReply> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow!("assistant api key not configured"))?;
        debug!(model = %self.model, "sending assistant request");
        let response: ChatResponse = self
            .client
            .post(&self.api_url)
            .bearer_auth(api_key)
            .json(&self.request(question))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        extract_reply(response, &self.model)
    }
}
