//! Suggestions drawn from earlier requests in the session.

use super::history::CommandAttempt;

/// Commands of past attempts whose request contains `user_prompt`.
///
/// Matching is a case-insensitive substring test with the new request as the
/// needle, so short follow-ups like "list" match "list files in /tmp".
pub fn suggest<'a, I>(user_prompt: &str, history: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a CommandAttempt>,
{
    let needle = user_prompt.to_lowercase();
    history
        .into_iter()
        .filter(|h| h.user_prompt.to_lowercase().contains(&needle))
        .map(|h| h.command.clone())
        .collect()
}
