//! Console output.
//!
//! Styled with crossterm; all interactive output goes to stdout so errors
//! from tracing on stderr stay separate.

use crate::assistant::generator::GenerationError;
use crate::assistant::report::{Reporter, Stage};
use crossterm::style::Stylize;
use std::io::{self, Write};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::warn;

/// Read one line of user input without its line ending.
///
/// Bytes that are not valid UTF-8 are replaced rather than rejected, so a
/// garbled line never ends a session. Returns `None` at end of input or when
/// the input can no longer be read.
pub async fn read_line<R>(input: &mut R) -> Option<String>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    match input.read_until(b'\n', &mut buf).await {
        Ok(0) => None,
        Ok(_) => {
            let line = String::from_utf8_lossy(&buf);
            Some(line.trim_end_matches(|c: char| c == '\n' || c == '\r').to_string())
        }
        Err(e) => {
            warn!("Failed to read input: {}", e);
            None
        }
    }
}

/// Print a prompt string without a newline.
pub fn print_prompt(label: &str) {
    print!("{}", label.bold().cyan());
    let _ = io::stdout().flush();
}

/// Print a titled block of text.
pub fn print_section(title: &str, body: &str) {
    println!("{}", title.bold().green());
    println!("{}", body);
}

pub fn print_error(message: &str) {
    println!("{} {}", "Error:".bold().red(), message);
}

pub fn print_note(message: &str) {
    println!("{}", message.dark_grey());
}

/// Reporter that writes the assistant's progress to the terminal.
pub struct ConsoleReporter {
    prompt: &'static str,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self { prompt: "Query:> " }
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter for ConsoleReporter {
    fn prompt(&mut self) {
        print_prompt(self.prompt);
    }

    fn suggestions(&mut self, commands: &[String]) {
        println!("{}", "Did you mean one of these commands?".yellow());
        for (i, command) in commands.iter().enumerate() {
            println!("  {}. {}", i + 1, command);
        }
    }

    fn running(&mut self, stage: Stage, command: &str) {
        let verb = match stage {
            Stage::Initial => "Running",
            Stage::Retry => "Retrying",
        };
        println!("{} command [{}] ...", verb, command.bold());
    }

    fn succeeded(&mut self, output: &str) {
        println!("{}", "Command executed successfully.".green());
        if !output.is_empty() {
            print_section("Command output:", output);
        }
    }

    fn failed(&mut self, tip: &str) {
        println!("{}", "Error executing command:".red());
        println!("{}", tip);
    }

    fn generation_failed(&mut self, error: &GenerationError) {
        print_error(&error.to_string());
        match error {
            GenerationError::MalformedResponse { raw, .. } => {
                print_note(&format!("Response: {}", raw));
                print_note("Tip: Please ensure your input is clear, or try simplifying your request.");
            }
            GenerationError::Request(_) => {
                print_note("Tip: Check your network connection and API key, then try again.");
            }
        }
    }
}
