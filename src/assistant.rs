// src/assistant.rs

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::BotError;

/// Persona of the console balance agent.
pub const CLI_PREAMBLE: &str = "You are an AI assistant for Metis L2 that can check ERC20 token balances. \
You can help users retrieve token information from the Metis Sepolia network.";

/// Persona of the Telegram bot.
pub const TELEGRAM_PREAMBLE: &str =
    "You are an advanced AI assistant built by [Alith](https://github.com/0xLazAI/alith).";

/// Free-text completion backend used for anything the bot does not handle itself.
#[async_trait]
pub trait AssistantClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, BotError>;
}

#[derive(Debug, Clone)]
pub struct AssistantSettings {
    pub api_url: String,
    pub api_key: SecretString,
    pub model: String,
    pub preamble: String,
    pub timeout: Duration,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// OpenAI-compatible `chat/completions` client with a fixed system persona.
#[derive(Clone)]
pub struct OpenAiAssistant {
    client: reqwest::Client,
    settings: AssistantSettings,
}

impl OpenAiAssistant {
    pub fn new(settings: AssistantSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            settings,
        }
    }
}

#[async_trait]
impl AssistantClient for OpenAiAssistant {
    async fn complete(&self, prompt: &str) -> Result<String, BotError> {
        let request = ChatRequest {
            model: &self.settings.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &self.settings.preamble,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
        };

        debug!(model = %self.settings.model, "Sending prompt to assistant");
        let response = self
            .client
            .post(&self.settings.api_url)
            .bearer_auth(self.settings.api_key.expose_secret())
            .json(&request)
            .timeout(self.settings.timeout)
            .send()
            .await
            .map_err(|e| {
                warn!("Assistant request failed: {}", e);
                BotError::Assistant(e.to_string())
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("Assistant returned {}: {}", status, body);
            return Err(BotError::Assistant(format!("HTTP {}", status)));
        }

        let payload: ChatResponse = response
            .json()
            .await
            .map_err(|e| BotError::Assistant(format!("invalid response: {}", e)))?;

        payload
            .choices
            .into_iter()
            .find_map(|choice| {
                let text = choice.message.content?.trim().to_string();
                (!text.is_empty()).then_some(text)
            })
            .ok_or_else(|| BotError::Assistant("empty completion".to_string()))
    }
}
