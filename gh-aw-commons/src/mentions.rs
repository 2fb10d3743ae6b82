//! `@mention` neutralization for safe-output content sanitization.
//!
//! Backticks `@handle` occurrences before agent-produced text reaches a
//! comment body, so the agent can never silently ping someone.

use regex::Regex;
use std::sync::LazyLock;

static MENTION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@([A-Za-z0-9](?:[A-Za-z0-9-]{0,37}[A-Za-z0-9])?)").unwrap());

/// Wrap every `@handle` mention in backticks so GitHub does not notify the
/// mentioned user when the agent's text is rendered in an issue or comment.
pub fn neutralize_mentions(input: &str) -> String {
    MENTION_REGEX
        .replace_all(input, "`@$1`")
        .into_owned()
}
