//! Classification of command failures into user-facing tips.

/// Turn a failed command's stderr into a tip. Falls back to stderr unchanged.
pub fn classify(command: &str, stderr: &str) -> String {
    if stderr.contains("ls:") && stderr.contains("No such file or directory") {
        return format!(
            "Tip: The directory in the command '{}' does not exist. Please check the path.",
            command
        );
    }

    let program = command.split_whitespace().next().unwrap_or(command);
    // bash and zsh say "command not found"; dash says "<program>: not found"
    if stderr.contains("command not found") || stderr.contains(&format!("{}: not found", program)) {
        return format!(
            "Tip: The command '{}' is not available. Please install it or check your spelling.",
            program
        );
    }

    stderr.to_string()
}
