//! Natural-language to shell-command assistant.
//!
//! The assistant:
//! - Builds a system prompt from the environment and recent history
//! - Asks the model for a single command as JSON
//! - Runs it through the host shell
//! - On failure, classifies the error and asks for one corrected command

pub mod attempt_log;
pub mod classify;
pub mod executor;
pub mod generator;
pub mod history;
pub mod prompt;
pub mod report;
pub mod retry;
pub mod session;
pub mod suggest;

pub use attempt_log::FileAttemptLog;
pub use executor::SystemShell;
pub use generator::LlmCommandGenerator;
pub use history::CommandHistory;
pub use session::AssistantSession;
