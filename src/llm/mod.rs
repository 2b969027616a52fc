//! LLM client for the OpenAI-compatible chat-completions API.
//!
//! Groq is the default provider; any endpoint speaking the same wire format
//! can be configured through `llm.base_url`.

pub mod groq;

pub use groq::ChatClient;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A backend that answers a list of messages with one completion.
#[async_trait]
pub trait ChatCompletion {
    async fn complete(&self, messages: &[ChatMessage], params: &CompletionParams)
        -> Result<String>;
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Sampling parameters for one completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionParams {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: Option<f32>,
    /// Constrain the response to a single JSON object.
    pub json_response: bool,
}

impl CompletionParams {
    /// Parameters for chat and summaries, taken from the `[llm]` section.
    pub fn from_llm_config(config: &crate::config::LlmConfig) -> Self {
        Self {
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            top_p: Some(config.top_p),
            json_response: false,
        }
    }

    /// Parameters for command generation: low temperature, JSON output.
    pub fn for_commands(config: &crate::config::Config) -> Self {
        Self {
            model: config.command_model().to_string(),
            max_tokens: config.assistant.max_tokens,
            temperature: config.assistant.temperature,
            top_p: None,
            json_response: true,
        }
    }
}
