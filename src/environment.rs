//! Host environment detection for command generation.
//!
//! Collects the facts the model needs to pick the right command syntax.

use std::path::{Path, PathBuf};

const DEFAULT_SHELL: &str = "/bin/bash";

/// Shell and operating system of the current session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentContext {
    /// Shell binary name, e.g. `zsh`.
    pub shell_name: String,
    /// Lowercase OS identifier, e.g. `linux` or `macos`.
    pub operating_system: String,
}

impl EnvironmentContext {
    pub fn new(shell_name: impl Into<String>, operating_system: impl Into<String>) -> Self {
        Self {
            shell_name: shell_name.into(),
            operating_system: operating_system.into(),
        }
    }
}

/// Detect the environment of the running process.
pub fn detect() -> EnvironmentContext {
    let shell = std::env::var("SHELL").ok();
    // Name the interpreter that will actually run commands when there is one.
    let resolved = resolve_shell_path(shell.as_deref());
    let shell = resolved
        .as_deref()
        .and_then(Path::to_str)
        .or(shell.as_deref());
    EnvironmentContext {
        shell_name: shell_name(shell),
        operating_system: std::env::consts::OS.to_lowercase(),
    }
}

/// Interpreter that should run generated commands, so they execute in the
/// shell the prompt names. `None` when neither `$SHELL` nor the default exists.
pub fn shell_path() -> Option<PathBuf> {
    resolve_shell_path(std::env::var("SHELL").ok().as_deref())
}

fn resolve_shell_path(shell_path: Option<&str>) -> Option<PathBuf> {
    shell_path
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
        .filter(|p| p.is_file())
        .or_else(|| Some(PathBuf::from(DEFAULT_SHELL)).filter(|p| p.is_file()))
}

/// Basename of the configured shell path, falling back to bash.
fn shell_name(shell_path: Option<&str>) -> String {
    let path = shell_path
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .unwrap_or(DEFAULT_SHELL);

    Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string())
}
