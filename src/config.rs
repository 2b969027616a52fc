//! Configuration management for croqli.
//!
//! Configuration is loaded from `~/.config/croqli/config.toml`. API keys may
//! live in the file but the environment variables take the same role.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const GROQ_API_URL: &str = "https://api.groq.com/openai/v1";

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// LLM endpoint and chat-mode sampling settings.
    #[serde(default)]
    pub llm: LlmConfig,
    /// Web search settings.
    #[serde(default)]
    pub search: SearchConfig,
    /// CLI assistant settings.
    #[serde(default)]
    pub assistant: AssistantConfig,
}

/// Settings for the OpenAI-compatible completion endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL of the chat-completions API (default: Groq).
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Model name (default: llama-3.3-70b-versatile).
    #[serde(default = "default_model")]
    pub model: String,
    /// API key (prefer GROQ_API_KEY env var).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Output token ceiling for chat and search summaries.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    /// System prompt used in chat mode. Empty means none.
    #[serde(default)]
    pub system_prompt: String,
    /// Client-side deadline for a single HTTP request.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            api_key: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            system_prompt: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl LlmConfig {
    /// Get the API key from config or environment.
    pub fn api_key(&self) -> Result<String> {
        self.api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| std::env::var("GROQ_API_KEY").ok())
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                anyhow!(
                    "GROQ API key not found. Set GROQ_API_KEY environment variable \
                     or add api_key to the [llm] section of the config file."
                )
            })
    }
}

/// Settings for the Tavily search backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// API key (prefer TAVILY_API_KEY env var).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Either "basic" or "advanced".
    #[serde(default = "default_search_depth")]
    pub search_depth: String,
    /// Approximate token budget for the context handed to the summarizer.
    #[serde(default = "default_search_max_tokens")]
    pub max_tokens: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            search_depth: default_search_depth(),
            max_tokens: default_search_max_tokens(),
        }
    }
}

impl SearchConfig {
    /// Get the API key from config or environment.
    pub fn api_key(&self) -> Result<String> {
        self.api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| std::env::var("TAVILY_API_KEY").ok())
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                anyhow!(
                    "Tavily API key not found. Set TAVILY_API_KEY environment variable \
                     or add api_key to the [search] section of the config file."
                )
            })
    }
}

/// Settings for the natural-language command assistant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// Model override for command generation. Falls back to `llm.model`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Temperature for command generation (kept low for near-deterministic output).
    #[serde(default = "default_command_temperature")]
    pub temperature: f32,
    /// Output token ceiling for command generation.
    #[serde(default = "default_command_max_tokens")]
    pub max_tokens: u32,
    /// Number of past attempts kept in memory.
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
    /// Number of past attempts shown to the model.
    #[serde(default = "default_history_context")]
    pub history_context: usize,
    /// Append-only attempt log. Defaults to the data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
    /// Cheat sheet JSON file. Defaults to `~/.croqli_cheatsheet.json`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cheat_sheet_path: Option<PathBuf>,
    /// Append the cheat sheet to the command-generation prompt.
    #[serde(default)]
    pub include_cheat_sheet: bool,
    /// Kill generated commands that run longer than this. No limit when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exec_timeout_secs: Option<u64>,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            model: None,
            temperature: default_command_temperature(),
            max_tokens: default_command_max_tokens(),
            history_capacity: default_history_capacity(),
            history_context: default_history_context(),
            log_file: None,
            cheat_sheet_path: None,
            include_cheat_sheet: false,
            exec_timeout_secs: None,
        }
    }
}

fn default_base_url() -> String {
    GROQ_API_URL.to_string()
}

fn default_model() -> String {
    "llama-3.3-70b-versatile".to_string()
}

fn default_max_tokens() -> u32 {
    8192
}

fn default_temperature() -> f32 {
    0.7
}

fn default_top_p() -> f32 {
    1.0
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_search_depth() -> String {
    "advanced".to_string()
}

fn default_search_max_tokens() -> usize {
    1500
}

fn default_command_temperature() -> f32 {
    0.1
}

fn default_command_max_tokens() -> u32 {
    32768
}

fn default_history_capacity() -> usize {
    10
}

fn default_history_context() -> usize {
    3
}

impl Config {
    /// Get the config directory path.
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join("croqli"))
            .context("Could not determine config directory")
    }

    /// Get the config file path.
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from file, using defaults if not found.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Model used for command generation.
    pub fn command_model(&self) -> &str {
        self.assistant.model.as_deref().unwrap_or(&self.llm.model)
    }

    /// Resolve the attempt log location.
    pub fn log_file(&self) -> Result<PathBuf> {
        match &self.assistant.log_file {
            Some(path) => Ok(path.clone()),
            None => dirs::data_local_dir()
                .map(|p| p.join("croqli").join("command_history.log"))
                .context("Could not determine data directory"),
        }
    }

    /// Resolve the cheat sheet location.
    pub fn cheat_sheet_path(&self) -> Result<PathBuf> {
        match &self.assistant.cheat_sheet_path {
            Some(path) => Ok(path.clone()),
            None => dirs::home_dir()
                .map(|p| p.join(".croqli_cheatsheet.json"))
                .context("Could not determine home directory"),
        }
    }
}
