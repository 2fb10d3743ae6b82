//! Content sanitization for rendering agent-produced text on human-facing
//! surfaces (issue bodies, comments, PR descriptions, step summaries):
//! ANSI/control-char stripping, mention and bot-command neutralization, XML
//! tag defanging, URL allow-list redaction, truncation, and secret-value
//! redaction.

use regex::Regex;
use std::sync::LazyLock;

/// Hard caps: truncate to 0.5 MB and 65,000 lines.
pub const MAX_SURFACE_BYTES: usize = 512_000;
pub const MAX_SURFACE_LINES: usize = 65_000;

static ANSI_ESCAPE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b\[[0-9;]*[A-Za-z]").unwrap());

static BOT_COMMAND_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(close[sd]?|fix(?:e[sd])?|resolve[sd]?)\s+#(\d+)").unwrap()
});

static XML_TAG_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"</?([A-Za-z][\w:-]*)[^>]*>").unwrap());

static URL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://([A-Za-z0-9.-]+)(?:[/:?#][^\s)\]]*)?").unwrap());

/// Remove ANSI escape sequences and C0 control characters (other than
/// newline and tab), which could otherwise corrupt rendered Markdown.
pub fn strip_control_chars(input: &str) -> String {
    let without_ansi = ANSI_ESCAPE_REGEX.replace_all(input, "");
    without_ansi
        .chars()
        .filter(|c| *c == '\n' || *c == '\t' || !c.is_control())
        .collect()
}

/// Backtick bot-command phrases like `fixes #12` so the sanitized surface
/// does not accidentally close or link unrelated issues.
pub fn neutralize_bot_commands(input: &str) -> String {
    BOT_COMMAND_REGEX
        .replace_all(input, "`$1 #$2`")
        .into_owned()
}

/// Convert XML/HTML-like tags into parenthesized plain text so they cannot
/// be used to inject markup (or, on some renderers, active content) into
/// the rendered surface.
pub fn defang_xml_tags(input: &str) -> String {
    XML_TAG_REGEX
        .replace_all(input, |caps: &regex::Captures<'_>| format!("({})", &caps[1]))
        .into_owned()
}

/// Replace URIs whose host is not present in `allowed_domains` (or a
/// subdomain of one) with `(redacted)`. `allowed_domains` is the effective
/// union of GitHub-host domains and any additional allowed domains
/// configured for the surface.
pub fn redact_urls_outside_allowlist(input: &str, allowed_domains: &[String]) -> String {
    URL_REGEX
        .replace_all(input, |caps: &regex::Captures<'_>| {
            let host = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            if domain_is_allowed(host, allowed_domains) {
                caps[0].to_string()
            } else {
                "(redacted)".to_string()
            }
        })
        .into_owned()
}

fn domain_is_allowed(host: &str, allowed_domains: &[String]) -> bool {
    let host = host.to_ascii_lowercase();
    allowed_domains.iter().any(|allowed| {
        let allowed = allowed.to_ascii_lowercase();
        host == allowed || host.ends_with(&format!(".{allowed}"))
    })
}

/// Truncate `input` to `MAX_SURFACE_BYTES` bytes and `MAX_SURFACE_LINES`
/// lines, whichever limit is hit first.
pub fn truncate_for_surface(input: &str) -> String {
    let mut out = String::with_capacity(input.len().min(MAX_SURFACE_BYTES));
    let mut lines = 0usize;
    for line in input.split_inclusive('\n') {
        if out.len() + line.len() > MAX_SURFACE_BYTES {
            break;
        }
        if lines >= MAX_SURFACE_LINES {
            break;
        }
        out.push_str(line);
        lines += 1;
    }
    out
}

/// Replace every runtime occurrence of `secret_value` with `***`.
pub fn redact_secret_values(input: &str, secret_values: &[String]) -> String {
    let mut out = input.to_string();
    for value in secret_values {
        if value.is_empty() {
            continue;
        }
        out = out.replace(value.as_str(), "***");
    }
    out
}

/// Run the full sanitization pipeline in order: strip control chars,
/// neutralize mentions, neutralize bot commands, defang XML tags, redact
/// disallowed URLs, then truncate.
pub fn sanitize_for_surface(input: &str, allowed_domains: &[String]) -> String {
    let stripped = strip_control_chars(input);
    let mentions_neutralized = crate::mentions::neutralize_mentions(&stripped);
    let commands_neutralized = neutralize_bot_commands(&mentions_neutralized);
    let defanged = defang_xml_tags(&commands_neutralized);
    let url_redacted = redact_urls_outside_allowlist(&defanged, allowed_domains);
    truncate_for_surface(&url_redacted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_ansi_sequences() {
        assert_eq!(strip_control_chars("\x1b[31mred\x1b[0m text"), "red text");
    }

    #[test]
    fn neutralizes_close_command() {
        assert_eq!(neutralize_bot_commands("this fixes #42"), "this `fixes #42`");
    }

    #[test]
    fn defangs_script_tag() {
        assert_eq!(defang_xml_tags("<script>alert(1)</script>"), "(script)alert(1)(script)");
    }

    #[test]
    fn redacts_disallowed_domain_but_keeps_allowed() {
        let allowed = vec!["github.com".to_string()];
        let input = "see https://api.github.com/repos/x and https://evil.example/y";
        let out = redact_urls_outside_allowlist(input, &allowed);
        assert!(out.contains("https://api.github.com/repos/x"));
        assert!(out.contains("(redacted)"));
        assert!(!out.contains("evil.example"));
    }

    #[test]
    fn truncates_to_line_cap() {
        let input = "line\n".repeat(MAX_SURFACE_LINES + 10);
        let out = truncate_for_surface(&input);
        assert_eq!(out.lines().count(), MAX_SURFACE_LINES);
    }

    #[test]
    fn redacts_named_secret_values() {
        let out = redact_secret_values("token=abcdef123456 end", &["abcdef123456".to_string()]);
        assert_eq!(out, "token=*** end");
    }

    #[test]
    fn full_pipeline_composes() {
        let allowed = vec!["github.com".to_string()];
        let out = sanitize_for_surface("hi @octocat, fixes #9 see https://evil.example/x", &allowed);
        assert!(out.contains("`@octocat`"));
        assert!(out.contains("`fixes #9`"));
        assert!(out.contains("(redacted)"));
    }
}
