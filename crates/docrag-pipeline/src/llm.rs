//! Chat-completion clients for OpenAI-compatible endpoints.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use docrag_core::config::LlmSettings;
use docrag_core::traits::ChatModel;
use docrag_core::types::{ChatMessage, GenerationParams};
use docrag_core::{Error, Result};

/// Answer returned when no API key is configured.
pub const NOT_CONFIGURED_ANSWER: &str = "The language model is not configured, so no answer could be generated.";

pub struct OpenAiChatModel {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    top_p: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl OpenAiChatModel {
    pub fn new(base_url: &str, api_key: &str, model: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }

    pub fn from_settings(llm: &LlmSettings) -> Self {
        Self::new(&llm.base_url, &llm.api_key, &llm.model)
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl ChatModel for OpenAiChatModel {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, messages: &[ChatMessage], params: &GenerationParams) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            messages,
            temperature: params.temperature,
            top_p: params.top_p,
            max_tokens: params.max_tokens,
            stream: false,
        };
        let url = self.endpoint();
        let mut req = self.client.post(&url).json(&body);
        if !self.api_key.is_empty() {
            req = req.bearer_auth(&self.api_key);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| Error::Transport(format!("{} connection failed ({}): {}", self.model, url, e)))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| Error::Transport(format!("failed to read response body: {e}")))?;
        if !status.is_success() {
            return Err(Error::Upstream { status: status.as_u16(), body: text });
        }

        let parsed: ChatResponse =
            serde_json::from_str(&text).map_err(|e| Error::MalformedResponse(format!("chat completion: {e}")))?;
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::MalformedResponse("no choices in response".into()))?;
        choice
            .message
            .content
            .ok_or_else(|| Error::MalformedResponse("first choice has no message content".into()))
    }
}

/// Stand-in used when no credential is configured.
pub struct DisabledChatModel;

#[async_trait]
impl ChatModel for DisabledChatModel {
    fn model_name(&self) -> &str {
        "disabled"
    }

    async fn complete(&self, _messages: &[ChatMessage], _params: &GenerationParams) -> Result<String> {
        Ok(NOT_CONFIGURED_ANSWER.to_string())
    }
}

pub fn chat_model_from_settings(llm: &LlmSettings) -> Arc<dyn ChatModel> {
    if llm.is_configured() {
        tracing::info!(model = %llm.model, base_url = %llm.base_url, "using chat completion endpoint");
        Arc::new(OpenAiChatModel::from_settings(llm))
    } else {
        tracing::warn!("llm.api_key is empty (set NVIDIA_KEY or APP_LLM__API_KEY); answers will be placeholders");
        Arc::new(DisabledChatModel)
    }
}
