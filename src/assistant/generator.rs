//! Command generation through the LLM.

use crate::llm::{ChatCompletion, ChatMessage, CompletionParams};
use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// The model's answer: a single shell command.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GeneratedCommandResponse {
    pub command: String,
}

/// Why no command could be obtained from the model.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The API call itself failed (network, HTTP status, empty choices).
    #[error("command generation request failed: {0}")]
    Request(String),
    /// The model answered with something other than `{"command": "..."}`.
    #[error("could not parse model response: {reason}")]
    MalformedResponse { reason: String, raw: String },
}

/// Anything that can turn a prompt pair into a command.
#[async_trait]
pub trait CommandGenerator {
    async fn generate(
        &self,
        system_prompt: &str,
        user_request: &str,
    ) -> Result<GeneratedCommandResponse, GenerationError>;
}

/// Generator backed by a chat-completions backend in JSON mode.
pub struct LlmCommandGenerator<C> {
    client: C,
    params: CompletionParams,
}

impl<C: ChatCompletion> LlmCommandGenerator<C> {
    pub fn new(client: C, params: CompletionParams) -> Self {
        Self { client, params }
    }
}

#[async_trait]
impl<C: ChatCompletion + Send + Sync> CommandGenerator for LlmCommandGenerator<C> {
    async fn generate(
        &self,
        system_prompt: &str,
        user_request: &str,
    ) -> Result<GeneratedCommandResponse, GenerationError> {
        let messages = [
            ChatMessage::system(system_prompt),
            ChatMessage::user(user_request),
        ];
        let raw = self
            .client
            .complete(&messages, &self.params)
            .await
            .map_err(|e| GenerationError::Request(format!("{:#}", e)))?;
        debug!("Model response: {}", raw);
        parse_command_response(&raw)
    }
}

/// Parse the model output into a command.
pub fn parse_command_response(raw: &str) -> Result<GeneratedCommandResponse, GenerationError> {
    let text = strip_code_fence(raw);

    let parsed: GeneratedCommandResponse =
        serde_json::from_str(text).map_err(|e| GenerationError::MalformedResponse {
            reason: e.to_string(),
            raw: raw.to_string(),
        })?;

    let command = parsed.command.trim();
    if command.is_empty() {
        return Err(GenerationError::MalformedResponse {
            reason: "the \"command\" field is empty".to_string(),
            raw: raw.to_string(),
        });
    }

    Ok(GeneratedCommandResponse {
        command: command.to_string(),
    })
}

/// Remove a surrounding markdown code block if the model added one.
fn strip_code_fence(response: &str) -> &str {
    let mut text = response.trim();

    if let Some(rest) = text.strip_prefix("```") {
        // Drop the language specifier line
        text = match rest.find('\n') {
            Some(newline) => &rest[newline + 1..],
            None => rest,
        };
        if let Some(end) = text.rfind("```") {
            text = &text[..end];
        }
    }

    text.trim()
}
