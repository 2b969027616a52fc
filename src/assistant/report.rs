//! Output seam for the assistant loop.

use super::generator::GenerationError;

/// Which execution of a request is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Initial,
    Retry,
}

/// Display sink for everything the assistant tells the user.
pub trait Reporter {
    /// Show the input prompt.
    fn prompt(&mut self);
    /// Past commands that look related to the new request.
    fn suggestions(&mut self, commands: &[String]);
    /// A command is about to run.
    fn running(&mut self, stage: Stage, command: &str);
    fn succeeded(&mut self, output: &str);
    fn failed(&mut self, tip: &str);
    fn generation_failed(&mut self, error: &GenerationError);
}
