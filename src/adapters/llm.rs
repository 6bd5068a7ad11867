//! Chat-completions client for OpenAI-compatible providers.

use crate::adapters::http::{api_key_from_env, build_client, endpoint, post_json};
use crate::domain::model::LlmSettings;
use crate::domain::ports::LanguageModel;
use crate::utils::error::{MatchError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const COLLABORATOR: &str = "language model";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Clone)]
pub struct OpenAiChatClient {
    client: Client,
    url: String,
    api_key: String,
    model: String,
    temperature: Option<f32>,
}

impl OpenAiChatClient {
    pub fn new(settings: &LlmSettings, api_key: String) -> Result<Self> {
        Ok(Self {
            client: build_client(settings.timeout_seconds)?,
            url: endpoint(&settings.base_url, "chat/completions"),
            api_key,
            model: settings.chat_model.clone(),
            temperature: settings.temperature,
        })
    }

    pub fn from_env(settings: &LlmSettings) -> Result<Self> {
        Self::new(settings, api_key_from_env()?)
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl LanguageModel for OpenAiChatClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
        };

        let response: ChatResponse =
            post_json(&self.client, &self.url, &self.api_key, &request, COLLABORATOR).await?;

        if let Some(usage) = &response.usage {
            tracing::debug!(
                "LLM call succeeded: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens,
                usage.completion_tokens
            );
        }

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| MatchError::EmptyResponse {
                collaborator: COLLABORATOR.to_string(),
            })
    }
}
