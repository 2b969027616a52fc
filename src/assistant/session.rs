//! The `Query:>` read-eval loop of the CLI assistant.

use super::executor::ShellExecutor;
use super::generator::CommandGenerator;
use super::history::CommandHistory;
use super::report::Reporter;
use super::retry::{RequestOutcome, RetryController};
use super::suggest::suggest;
use crate::environment::EnvironmentContext;
use crate::ui;
use anyhow::Result;
use tokio::io::AsyncBufRead;
use tracing::info;

/// Keywords that end the session, matched case-insensitively after trimming.
const EXIT_KEYWORDS: [&str; 2] = ["exit", "quit"];

/// One assistant session. Owns the history for its whole lifetime.
pub struct AssistantSession<G, E> {
    generator: G,
    executor: E,
    env: EnvironmentContext,
    history: CommandHistory,
    history_context: usize,
    cheat_sheet: Option<String>,
}

impl<G, E> AssistantSession<G, E>
where
    G: CommandGenerator + Sync,
    E: ShellExecutor + Sync,
{
    pub fn new(generator: G, executor: E, env: EnvironmentContext, history: CommandHistory) -> Self {
        Self {
            generator,
            executor,
            env,
            history,
            history_context: 3,
            cheat_sheet: None,
        }
    }

    /// Number of past attempts included in the system prompt.
    pub fn with_history_context(mut self, n: usize) -> Self {
        self.history_context = n;
        self
    }

    /// Opaque context appended to every system prompt.
    pub fn with_cheat_sheet(mut self, cheat_sheet: Option<String>) -> Self {
        self.cheat_sheet = cheat_sheet;
        self
    }

    pub fn history(&self) -> &CommandHistory {
        &self.history
    }

    /// Read requests until EOF or an exit keyword.
    pub async fn run<R>(&mut self, mut input: R, reporter: &mut dyn Reporter) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        info!(
            "Assistant session started (shell: {}, os: {})",
            self.env.shell_name, self.env.operating_system
        );

        loop {
            reporter.prompt();
            let Some(line) = ui::read_line(&mut input).await else {
                break;
            };

            let request = line.trim();
            if request.is_empty() {
                continue;
            }
            if is_exit(request) {
                break;
            }

            self.handle_request(request, reporter).await;
        }

        info!("Assistant session ended after {} recorded attempts", self.history.len());
        Ok(())
    }

    /// Suggest, then generate and execute with a single retry.
    pub async fn handle_request(
        &mut self,
        request: &str,
        reporter: &mut dyn Reporter,
    ) -> RequestOutcome {
        let suggestions = suggest(request, self.history.all());
        if !suggestions.is_empty() {
            reporter.suggestions(&suggestions);
        }

        let controller = RetryController {
            generator: &self.generator,
            executor: &self.executor,
            env: &self.env,
            cheat_sheet: self.cheat_sheet.as_deref(),
            history_context: self.history_context,
        };
        controller.run(request, &mut self.history, reporter).await
    }
}

fn is_exit(request: &str) -> bool {
    let request = request.trim().to_lowercase();
    EXIT_KEYWORDS.contains(&request.as_str())
}
