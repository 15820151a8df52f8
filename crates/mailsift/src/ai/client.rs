//! OpenAI-compatible `/chat/completions` client.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ai::analysis::BatchAnalysis;
use crate::ai::prompt;
use crate::ai::{AiError, BatchSummarizer, CategoryClassifier, DigestItem};
use crate::config::AiConfig;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Client for a chat-completions endpoint, used for both category
/// classification and batch summaries.
pub struct ChatCompletionsClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: SecretString,
}

impl ChatCompletionsClient {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: SecretString,
    ) -> Result<Self, AiError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("mailsift/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
        })
    }

    /// Builds a client from configuration, resolving the API key.
    pub fn from_config(config: &AiConfig) -> Result<Self, AiError> {
        if !config.enabled {
            return Err(AiError::NotConfigured("ai.enabled is false".to_string()));
        }
        let api_key = config.api_key_source().resolve()?;
        Self::new(&config.base_url, &config.model, api_key)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, system: String, user: String) -> Result<String, AiError> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system,
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user,
                },
            ],
            temperature: 0.0,
        };

        debug!(url = %url, model = %self.model, "Calling chat completions");

        let response = self
            .http
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AiError::Status {
                status: status.as_u16(),
                body: body.chars().take(500).collect(),
            });
        }

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or(AiError::EmptyResponse)
    }
}

#[async_trait]
impl CategoryClassifier for ChatCompletionsClient {
    async fn classify_category(
        &self,
        sender: &str,
        subject: &str,
        body: &str,
    ) -> Result<String, AiError> {
        self.complete(
            prompt::classification_system_prompt(),
            prompt::classification_user_prompt(sender, subject, body),
        )
        .await
    }
}

#[async_trait]
impl BatchSummarizer for ChatCompletionsClient {
    async fn summarize_and_prioritize(
        &self,
        items: &[DigestItem],
    ) -> Result<BatchAnalysis, AiError> {
        let raw = self
            .complete(
                prompt::summary_system_prompt().to_string(),
                prompt::summary_user_prompt(items),
            )
            .await?;
        Ok(BatchAnalysis::parse(&raw))
    }
}
