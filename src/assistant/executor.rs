//! Execution of generated command lines.
//!
//! This is the only place a model-generated string reaches the host shell.
//! Commands run through the interpreter with full metacharacter expansion so
//! pipes and redirects work.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Exit status reported when a command exceeds the configured timeout.
const TIMEOUT_EXIT_CODE: i32 = 124;

/// Captured result of one command run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl ExecutionResult {
    pub fn new(stdout: impl Into<String>, stderr: impl Into<String>, exit_code: i32) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
            exit_code,
        }
    }

    /// A launch-level failure: the interpreter could not be run at all.
    fn launch_failure(message: impl Into<String>) -> Self {
        Self::new("", message, 1)
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs a raw command line. Never fails: launch errors become data.
#[async_trait]
pub trait ShellExecutor {
    async fn execute(&self, command: &str) -> ExecutionResult;
}

#[cfg(windows)]
const DEFAULT_INTERPRETER: &str = "cmd";
#[cfg(windows)]
const COMMAND_FLAG: &str = "/C";
#[cfg(not(windows))]
const DEFAULT_INTERPRETER: &str = "sh";
#[cfg(not(windows))]
const COMMAND_FLAG: &str = "-c";

/// Executor running command lines through an interpreter, `sh` unless
/// another one is set with [`SystemShell::with_program`].
#[derive(Debug, Clone)]
pub struct SystemShell {
    program: PathBuf,
    timeout: Option<Duration>,
}

impl Default for SystemShell {
    fn default() -> Self {
        Self::new(None)
    }
}

impl SystemShell {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self {
            program: PathBuf::from(DEFAULT_INTERPRETER),
            timeout,
        }
    }

    /// Use `program` as the interpreter. It must accept `-c <command>`.
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn command(&self, command_line: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg(COMMAND_FLAG)
            .arg(command_line)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl ShellExecutor for SystemShell {
    async fn execute(&self, command: &str) -> ExecutionResult {
        debug!("Executing with {}: {}", self.program.display(), command);
        let mut cmd = self.command(command);
        let output = cmd.output();

        let output = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, output).await {
                Ok(result) => result,
                Err(_) => {
                    return ExecutionResult::new(
                        "",
                        format!("command timed out after {}s", limit.as_secs()),
                        TIMEOUT_EXIT_CODE,
                    )
                }
            },
            None => output.await,
        };

        match output {
            Ok(output) => ExecutionResult {
                stdout: String::from_utf8_lossy(&output.stdout).trim_end().to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim_end().to_string(),
                // Killed by a signal: no code
                exit_code: output.status.code().unwrap_or(1),
            },
            Err(e) => ExecutionResult::launch_failure(e.to_string()),
        }
    }
}
