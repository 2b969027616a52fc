//! Prompt construction for command generation.

use super::history::CommandAttempt;
use crate::environment::EnvironmentContext;

/// Default "open" command and browser for a platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformInfo {
    pub open_command: &'static str,
    pub browser: &'static str,
}

const UNKNOWN_PLATFORM: PlatformInfo = PlatformInfo {
    open_command: "unknown",
    browser: "unknown",
};

/// Look up platform defaults by OS identifier.
pub fn platform_info(operating_system: &str) -> PlatformInfo {
    match operating_system {
        "macos" => PlatformInfo {
            open_command: "open",
            browser: "Safari",
        },
        "linux" => PlatformInfo {
            open_command: "xdg-open",
            browser: "firefox",
        },
        "windows" => PlatformInfo {
            open_command: "start",
            browser: "Microsoft Edge",
        },
        _ => UNKNOWN_PLATFORM,
    }
}

/// Build the system prompt for the command generator.
///
/// `history` should already be cut down to the entries the model should see;
/// the optional cheat sheet is appended verbatim.
pub fn build_system_prompt(
    env: &EnvironmentContext,
    history: &[&CommandAttempt],
    cheat_sheet: Option<&str>,
) -> String {
    let platform = platform_info(&env.operating_system);

    let history_info = history
        .iter()
        .map(|h| {
            format!(
                "Previous Command: {}, Success: {}, Error: {}",
                h.command,
                h.success,
                h.error.as_deref().unwrap_or("None")
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let cheat_sheet_info = cheat_sheet
        .filter(|c| !c.trim().is_empty())
        .map(|c| format!("\nCheat Sheet:\n{}\n", c))
        .unwrap_or_default();

    format!(
        r#"You are an AI assistant that converts natural language requests into a single shell command to execute on the user's machine. Analyze the request, determine the best command, and return it.

Rules:
- Respond with ONLY a JSON object with a single "command" key, e.g. {{"command": "ls -l"}}
- The command must be a single line that runs in the shell below
- No explanation, no markdown, no additional keys

Environment Information:
- Shell: {shell}
- Operating System: {os}
- Open Command: {open_command}
- Default Browser: {browser}

{history_info}
{cheat_sheet_info}
Be concise and only provide the necessary command. Your goal is the most appropriate command for the user's request."#,
        shell = env.shell_name,
        os = env.operating_system,
        open_command = platform.open_command,
        browser = platform.browser,
        history_info = history_info,
        cheat_sheet_info = cheat_sheet_info,
    )
}

/// Build the user message asking for a corrected command.
pub fn build_retry_prompt(user_prompt: &str, failed_command: &str, tip: &str) -> String {
    format!(
        "The last command failed with the following error: {tip}. \
         Please modify the command to fix the error.\n\
         Failed command: {failed_command}\n\
         Original request: {user_prompt}"
    )
}
