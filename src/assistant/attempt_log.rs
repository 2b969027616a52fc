//! Append-only log of executed commands.
//!
//! Each recorded attempt becomes one line:
//! `2024-05-01 12:00:00 | Command: ls -l | Result: Success`

use super::history::CommandAttempt;
use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Durable sink for recorded attempts.
pub trait AttemptLog {
    fn append(&mut self, attempt: &CommandAttempt) -> Result<()>;
}

/// Attempt log backed by a text file.
pub struct FileAttemptLog {
    path: PathBuf,
}

impl FileAttemptLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AttemptLog for FileAttemptLog {
    fn append(&mut self, attempt: &CommandAttempt) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open attempt log: {}", self.path.display()))?;

        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        writeln!(file, "{}", format_line(&timestamp.to_string(), attempt))
            .with_context(|| format!("Failed to write attempt log: {}", self.path.display()))?;
        Ok(())
    }
}

fn format_line(timestamp: &str, attempt: &CommandAttempt) -> String {
    let result = if attempt.success { "Success" } else { "Error" };
    format!(
        "{} | Command: {} | Result: {}",
        timestamp, attempt.command, result
    )
}
