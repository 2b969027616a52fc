//! Conversational chat mode.

use crate::llm::{ChatCompletion, ChatMessage, CompletionParams};
use crate::ui;
use anyhow::Result;
use tokio::io::AsyncBufRead;
use tracing::{info, warn};

const EXIT_KEYWORDS: [&str; 3] = ["exit", "/quit", "/back"];

/// A conversation with the model. History lives as long as the session.
pub struct ChatSession<C> {
    client: C,
    params: CompletionParams,
    system_prompt: Option<String>,
    history: Vec<ChatMessage>,
}

impl<C: ChatCompletion> ChatSession<C> {
    pub fn new(client: C, params: CompletionParams, system_prompt: &str) -> Self {
        let system_prompt = Some(system_prompt.trim())
            .filter(|p| !p.is_empty())
            .map(str::to_string);
        Self {
            client,
            params,
            system_prompt,
            history: Vec::new(),
        }
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// Send one message. The exchange is kept only if the model answers.
    pub async fn send(&mut self, input: &str) -> Result<String> {
        let mut messages = Vec::with_capacity(self.history.len() + 2);
        if let Some(system_prompt) = &self.system_prompt {
            messages.push(ChatMessage::system(system_prompt.as_str()));
        }
        messages.extend(self.history.iter().cloned());
        messages.push(ChatMessage::user(input));

        let response = self.client.complete(&messages, &self.params).await?;

        self.history.push(ChatMessage::user(input));
        self.history.push(ChatMessage::assistant(response.as_str()));
        Ok(response)
    }

    /// Read messages until EOF or an exit keyword.
    pub async fn run<R>(&mut self, mut input: R) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        info!("Chat session started");

        loop {
            ui::print_prompt("You:> ");
            let Some(line) = ui::read_line(&mut input).await else {
                break;
            };

            let message = line.trim();
            if is_exit(message) {
                break;
            }
            if message.is_empty() {
                continue;
            }

            match self.send(message).await {
                Ok(response) => ui::print_section("Response:", &response),
                Err(e) => {
                    warn!("Chat request failed: {:#}", e);
                    ui::print_error(&format!("An error occurred: {:#}", e));
                }
            }
        }

        ui::print_note("Exiting chat mode.");
        Ok(())
    }
}

fn is_exit(message: &str) -> bool {
    EXIT_KEYWORDS.contains(&message.to_lowercase().as_str())
}
