//! Groq chat-completions client.
//!
//! Groq exposes an OpenAI-compatible API, so the same request and response
//! shapes work for OpenAI and other compatible providers.

use super::{ChatCompletion, ChatMessage, CompletionParams};
use crate::config::LlmConfig;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// HTTP client bound to one endpoint and API key.
pub struct ChatClient {
    base_url: String,
    api_key: String,
    client: Client,
}

impl ChatClient {
    /// Create a client from the `[llm]` config section.
    ///
    /// Fails when no API key is configured, which aborts startup.
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let api_key = config.api_key()?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            client,
        })
    }
}

#[async_trait]
impl ChatCompletion for ChatClient {
    /// Run one completion and return the text of the first choice.
    async fn complete(
        &self,
        messages: &[ChatMessage],
        params: &CompletionParams,
    ) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = CompletionRequest::new(messages, params);
        debug!(model = %params.model, messages = messages.len(), "sending completion request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .context("Failed to connect to the LLM API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body: Result<ApiError, _> = response.json().await;
            let message = body
                .map(|e| e.error.message)
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(anyhow!(
                "LLM API request failed with status {}: {}",
                status,
                message
            ));
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .context("Failed to parse LLM API response")?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| anyhow!("Empty response from LLM API"))
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

impl<'a> CompletionRequest<'a> {
    fn new(messages: &'a [ChatMessage], params: &'a CompletionParams) -> Self {
        Self {
            model: &params.model,
            messages,
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            top_p: params.top_p,
            response_format: params.json_response.then(|| ResponseFormat {
                format_type: "json_object",
            }),
        }
    }
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}
