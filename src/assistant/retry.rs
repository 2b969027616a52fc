//! Generate, execute and retry once.
//!
//! A request moves through
//! `Idle -> Generated -> Executed -> [Retrying -> RetryExecuted] -> Done`.
//! Only execution failures are retried, and only once. Generation failures
//! end the request immediately.

use super::classify::classify;
use super::executor::ShellExecutor;
use super::generator::{CommandGenerator, GenerationError};
use super::history::{CommandAttempt, CommandHistory};
use super::prompt::{build_retry_prompt, build_system_prompt};
use super::report::{Reporter, Stage};
use crate::environment::EnvironmentContext;
use tracing::{debug, info};

/// How a request ended.
#[derive(Debug)]
pub enum RequestOutcome {
    /// A command exited with status zero.
    Succeeded {
        attempt: CommandAttempt,
        retried: bool,
    },
    /// The last command run failed. With `retried` set, the retry was exhausted.
    Failed {
        attempt: CommandAttempt,
        retried: bool,
    },
    /// No usable command was produced.
    GenerationFailed { error: GenerationError, stage: Stage },
}

impl RequestOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RequestOutcome::Succeeded { .. })
    }
}

/// Drives one request through the retry state machine.
///
/// Borrows everything from the owning session; holds no state of its own
/// between requests.
pub struct RetryController<'a, G, E> {
    pub generator: &'a G,
    pub executor: &'a E,
    pub env: &'a EnvironmentContext,
    pub cheat_sheet: Option<&'a str>,
    pub history_context: usize,
}

impl<'a, G, E> RetryController<'a, G, E>
where
    G: CommandGenerator + Sync,
    E: ShellExecutor + Sync,
{
    /// Handle one natural-language request end to end.
    pub async fn run(
        &self,
        user_prompt: &str,
        history: &mut CommandHistory,
        reporter: &mut dyn Reporter,
    ) -> RequestOutcome {
        let system_prompt = self.system_prompt(history);
        let generated = match self.generator.generate(&system_prompt, user_prompt).await {
            Ok(generated) => generated,
            Err(error) => return self.generation_failed(error, Stage::Initial, reporter),
        };

        let attempt = self
            .execute(user_prompt, &generated.command, Stage::Initial, history, reporter)
            .await;
        if attempt.success {
            return RequestOutcome::Succeeded {
                attempt,
                retried: false,
            };
        }

        // The failed attempt is already in history, so the regenerated system
        // prompt shows it to the model.
        let tip = attempt.error.clone().unwrap_or_default();
        let retry_prompt = build_retry_prompt(user_prompt, &attempt.command, &tip);
        let system_prompt = self.system_prompt(history);
        info!("Retrying after failure of: {}", attempt.command);

        let generated = match self.generator.generate(&system_prompt, &retry_prompt).await {
            Ok(generated) => generated,
            Err(error) => return self.generation_failed(error, Stage::Retry, reporter),
        };

        let attempt = self
            .execute(user_prompt, &generated.command, Stage::Retry, history, reporter)
            .await;
        if attempt.success {
            RequestOutcome::Succeeded {
                attempt,
                retried: true,
            }
        } else {
            RequestOutcome::Failed {
                attempt,
                retried: true,
            }
        }
    }

    fn system_prompt(&self, history: &CommandHistory) -> String {
        let recent = history.recent(self.history_context);
        let prompt = build_system_prompt(self.env, &recent, self.cheat_sheet);
        debug!("System prompt:\n{}", prompt);
        prompt
    }

    /// Run one command, record it and report the result.
    async fn execute(
        &self,
        user_prompt: &str,
        command: &str,
        stage: Stage,
        history: &mut CommandHistory,
        reporter: &mut dyn Reporter,
    ) -> CommandAttempt {
        reporter.running(stage, command);
        let result = self.executor.execute(command).await;
        debug!(exit_code = result.exit_code, "Command finished");

        let attempt = if result.success() {
            reporter.succeeded(&result.stdout);
            CommandAttempt::succeeded(user_prompt, command, result.stdout)
        } else {
            let mut tip = classify(command, &result.stderr);
            if tip.trim().is_empty() {
                tip = format!("exited with status {} and no error output", result.exit_code);
            }
            reporter.failed(&tip);
            CommandAttempt::failed(user_prompt, command, tip)
        };

        history.record(attempt.clone());
        attempt
    }

    fn generation_failed(
        &self,
        error: GenerationError,
        stage: Stage,
        reporter: &mut dyn Reporter,
    ) -> RequestOutcome {
        info!("Command generation failed ({:?}): {}", stage, error);
        reporter.generation_failed(&error);
        RequestOutcome::GenerationFailed { error, stage }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::assistant::executor::ExecutionResult;
    use crate::assistant::generator::{parse_command_response, GeneratedCommandResponse};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Generator that replays canned model responses.
    pub struct ScriptedGenerator {
        responses: Mutex<VecDeque<String>>,
        pub calls: Mutex<Vec<(String, String)>>,
    }

    impl ScriptedGenerator {
        pub fn new(responses: &[&str]) -> Self {
            Self {
                responses: Mutex::new(responses.iter().map(|r| r.to_string()).collect()),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl CommandGenerator for ScriptedGenerator {
        async fn generate(
            &self,
            system_prompt: &str,
            user_request: &str,
        ) -> Result<GeneratedCommandResponse, GenerationError> {
            self.calls
                .lock()
                .unwrap()
                .push((system_prompt.to_string(), user_request.to_string()));
            let raw = self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| "no more scripted responses".to_string());
            parse_command_response(&raw)
        }
    }

    /// Executor that replays canned results and records what it ran.
    pub struct ScriptedShell {
        results: Mutex<VecDeque<ExecutionResult>>,
        pub commands: Mutex<Vec<String>>,
    }

    impl ScriptedShell {
        pub fn new(results: Vec<ExecutionResult>) -> Self {
            Self {
                results: Mutex::new(results.into()),
                commands: Mutex::new(Vec::new()),
            }
        }

        pub fn executed(&self) -> Vec<String> {
            self.commands.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ShellExecutor for ScriptedShell {
        async fn execute(&self, command: &str) -> ExecutionResult {
            self.commands.lock().unwrap().push(command.to_string());
            self.results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| ExecutionResult::new("", "unexpected execution", 99))
        }
    }

    /// Reporter that keeps a transcript of events.
    #[derive(Default)]
    pub struct RecordingReporter {
        pub events: Vec<String>,
    }

    impl Reporter for RecordingReporter {
        fn prompt(&mut self) {
            self.events.push("prompt".to_string());
        }

        fn suggestions(&mut self, commands: &[String]) {
            self.events.push(format!("suggest {}", commands.join(",")));
        }

        fn running(&mut self, stage: Stage, command: &str) {
            self.events.push(format!("run {:?} {}", stage, command));
        }

        fn succeeded(&mut self, output: &str) {
            self.events.push(format!("ok {}", output));
        }

        fn failed(&mut self, tip: &str) {
            self.events.push(format!("fail {}", tip));
        }

        fn generation_failed(&mut self, error: &GenerationError) {
            self.events.push(format!("gen-error {}", error));
        }
    }

    fn env() -> EnvironmentContext {
        EnvironmentContext::new("bash", "linux")
    }

    fn controller<'a>(
        generator: &'a ScriptedGenerator,
        shell: &'a ScriptedShell,
        env: &'a EnvironmentContext,
    ) -> RetryController<'a, ScriptedGenerator, ScriptedShell> {
        RetryController {
            generator,
            executor: shell,
            env,
            cheat_sheet: None,
            history_context: 3,
        }
    }

    #[tokio::test]
    async fn test_success_without_retry() {
        let generator = ScriptedGenerator::new(&[r#"{"command": "ls -l"}"#]);
        let shell = ScriptedShell::new(vec![ExecutionResult::new("file1\nfile2", "", 0)]);
        let env = env();
        let mut history = CommandHistory::new(10);
        let mut reporter = RecordingReporter::default();

        let outcome = controller(&generator, &shell, &env)
            .run("list files", &mut history, &mut reporter)
            .await;

        match outcome {
            RequestOutcome::Succeeded { attempt, retried } => {
                assert!(!retried);
                assert!(attempt.success);
                assert_eq!(attempt.output.as_deref(), Some("file1\nfile2"));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(generator.call_count(), 1);
        assert_eq!(shell.executed(), vec!["ls -l"]);
        assert_eq!(history.len(), 1);
        assert_eq!(
            reporter.events,
            vec!["run Initial ls -l", "ok file1\nfile2"]
        );
    }

    #[tokio::test]
    async fn test_failure_then_successful_retry() {
        let generator =
            ScriptedGenerator::new(&[r#"{"command": "lsx -l"}"#, r#"{"command": "ls -l"}"#]);
        let shell = ScriptedShell::new(vec![
            ExecutionResult::new("", "bash: lsx: command not found", 1),
            ExecutionResult::new("file1", "", 0),
        ]);
        let env = env();
        let mut history = CommandHistory::new(10);
        let mut reporter = RecordingReporter::default();

        let outcome = controller(&generator, &shell, &env)
            .run("list files", &mut history, &mut reporter)
            .await;

        assert!(outcome.is_success());
        assert_eq!(shell.executed(), vec!["lsx -l", "ls -l"]);

        let calls = generator.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        let (retry_system, retry_user) = &calls[1];
        assert!(retry_user.contains("The last command failed with the following error"));
        assert!(retry_user.contains("'lsx'"));
        assert!(retry_system.contains("Previous Command: lsx -l, Success: false"));

        let last = history.all().last().unwrap();
        assert!(last.success);
        assert_eq!(last.command, "ls -l");
        assert_eq!(last.user_prompt, "list files");
    }

    #[tokio::test]
    async fn test_failed_retry_is_final() {
        let generator =
            ScriptedGenerator::new(&[r#"{"command": "lsx -l"}"#, r#"{"command": "lsy -l"}"#]);
        let shell = ScriptedShell::new(vec![
            ExecutionResult::new("", "bash: lsx: command not found", 1),
            ExecutionResult::new("", "bash: lsy: command not found", 127),
        ]);
        let env = env();
        let mut history = CommandHistory::new(10);
        let mut reporter = RecordingReporter::default();

        let outcome = controller(&generator, &shell, &env)
            .run("list files", &mut history, &mut reporter)
            .await;

        match outcome {
            RequestOutcome::Failed { attempt, retried } => {
                assert!(retried);
                assert!(!attempt.success);
                assert!(attempt.error.unwrap().contains("'lsy'"));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(generator.call_count(), 2);
        assert_eq!(shell.executed().len(), 2);

        let last = history.all().last().unwrap();
        assert!(!last.success);
        assert!(last.error.as_deref().unwrap().contains("'lsy'"));
        assert_eq!(history.len(), 2);
    }

    #[tokio::test]
    async fn test_malformed_response_is_not_retried() {
        let generator = ScriptedGenerator::new(&[r#"{"cmd": "ls"}"#]);
        let shell = ScriptedShell::new(vec![]);
        let env = env();
        let mut history = CommandHistory::new(10);
        let mut reporter = RecordingReporter::default();

        let outcome = controller(&generator, &shell, &env)
            .run("list files", &mut history, &mut reporter)
            .await;

        assert!(matches!(
            outcome,
            RequestOutcome::GenerationFailed {
                error: GenerationError::MalformedResponse { .. },
                stage: Stage::Initial
            }
        ));
        assert_eq!(generator.call_count(), 1);
        assert!(shell.executed().is_empty());
        assert!(history.is_empty());
        assert_eq!(reporter.events.len(), 1);
        assert!(reporter.events[0].starts_with("gen-error"));
    }

    #[tokio::test]
    async fn test_malformed_retry_response_ends_request() {
        let generator = ScriptedGenerator::new(&[r#"{"command": "lsx"}"#, "not json"]);
        let shell = ScriptedShell::new(vec![ExecutionResult::new(
            "",
            "bash: lsx: command not found",
            127,
        )]);
        let env = env();
        let mut history = CommandHistory::new(10);
        let mut reporter = RecordingReporter::default();

        let outcome = controller(&generator, &shell, &env)
            .run("list", &mut history, &mut reporter)
            .await;

        assert!(matches!(
            outcome,
            RequestOutcome::GenerationFailed {
                stage: Stage::Retry,
                ..
            }
        ));
        assert_eq!(shell.executed(), vec!["lsx"]);
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn test_history_context_limits_prompt() {
        let generator = ScriptedGenerator::new(&[r#"{"command": "pwd"}"#]);
        let shell = ScriptedShell::new(vec![ExecutionResult::new("/home", "", 0)]);
        let env = env();
        let mut history = CommandHistory::new(10);
        for i in 0..5 {
            history.record(CommandAttempt::succeeded("x", format!("old{}", i), ""));
        }
        let mut reporter = RecordingReporter::default();

        controller(&generator, &shell, &env)
            .run("where am i", &mut history, &mut reporter)
            .await;

        let calls = generator.calls.lock().unwrap();
        let system = &calls[0].0;
        assert!(!system.contains("old1,"));
        assert!(system.contains("old2,"));
        assert!(system.contains("old4,"));
    }

    #[tokio::test]
    async fn test_silent_failure_reports_exit_status() {
        let generator = ScriptedGenerator::new(&[
            r#"{"command": "grep needle haystack.txt"}"#,
            r#"{"command": "grep -i needle haystack.txt"}"#,
        ]);
        let shell = ScriptedShell::new(vec![
            ExecutionResult::new("", "", 1),
            ExecutionResult::new("Needle", "", 0),
        ]);
        let env = env();
        let mut history = CommandHistory::new(10);
        let mut reporter = RecordingReporter::default();

        controller(&generator, &shell, &env)
            .run("find needle", &mut history, &mut reporter)
            .await;

        assert!(reporter
            .events
            .contains(&"fail exited with status 1 and no error output".to_string()));
        let first = history.all().next().unwrap();
        assert_eq!(
            first.error.as_deref(),
            Some("exited with status 1 and no error output")
        );
        let calls = generator.calls.lock().unwrap();
        assert!(calls[1]
            .1
            .contains("failed with the following error: exited with status 1"));
    }
}
