//! Bounded in-memory history of command attempts.

use super::attempt_log::AttemptLog;
use std::collections::VecDeque;
use tracing::warn;

/// One request and the outcome of running the command generated for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandAttempt {
    /// The natural-language request as typed.
    pub user_prompt: String,
    /// The shell command that was executed.
    pub command: String,
    /// True iff the command exited with status zero.
    pub success: bool,
    /// Captured stdout, set on success.
    pub output: Option<String>,
    /// Classified error tip, set on failure.
    pub error: Option<String>,
}

impl CommandAttempt {
    pub fn succeeded(
        user_prompt: impl Into<String>,
        command: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        Self {
            user_prompt: user_prompt.into(),
            command: command.into(),
            success: true,
            output: Some(output.into()),
            error: None,
        }
    }

    pub fn failed(
        user_prompt: impl Into<String>,
        command: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            user_prompt: user_prompt.into(),
            command: command.into(),
            success: false,
            output: None,
            error: Some(error.into()),
        }
    }
}

/// Fixed-capacity FIFO of past attempts, owned by one session.
///
/// Every recorded attempt is also written to the attempt log. The log is a
/// side channel: a write failure is logged and the attempt is kept.
pub struct CommandHistory {
    entries: VecDeque<CommandAttempt>,
    capacity: usize,
    log: Option<Box<dyn AttemptLog + Send>>,
}

impl CommandHistory {
    /// Create an empty history without a log sink.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            log: None,
        }
    }

    /// Attach a durable log sink.
    pub fn with_log(mut self, log: impl AttemptLog + Send + 'static) -> Self {
        self.log = Some(Box::new(log));
        self
    }

    /// Append an attempt, evicting the oldest entry when full.
    pub fn record(&mut self, attempt: CommandAttempt) {
        if let Some(log) = self.log.as_mut() {
            if let Err(e) = log.append(&attempt) {
                warn!("Failed to write attempt log: {:#}", e);
            }
        }

        self.entries.push_back(attempt);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// The last `n` entries, oldest first.
    pub fn recent(&self, n: usize) -> Vec<&CommandAttempt> {
        let skip = self.entries.len().saturating_sub(n);
        self.entries.iter().skip(skip).collect()
    }

    /// Every entry, oldest first.
    pub fn all(&self) -> impl Iterator<Item = &CommandAttempt> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
