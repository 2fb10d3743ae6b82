//! Per-engine log parsers. Each engine frames its run log differently;
//! every parser's job is only to normalize that framing into [`LogEvent`]s,
//! not to interpret them — `report::RunSummary` does the interpretation.

use crate::report::LogEvent;
use regex::Regex;
use std::sync::LazyLock;

pub trait LogParser {
    fn parse(&self, log_text: &str) -> Vec<LogEvent>;
}

fn parse_jsonl_line(line: &str) -> Option<LogEvent> {
    let value: serde_json::Value = serde_json::from_str(line).ok()?;
    match value.get("type").and_then(|v| v.as_str())? {
        "tool_call" => Some(LogEvent::ToolCall {
            name: value.get("name")?.as_str()?.to_string(),
        }),
        "mcp_status" => Some(LogEvent::McpServerStatus {
            server: value.get("server")?.as_str()?.to_string(),
            ok: value.get("ok")?.as_bool()?,
            detail: value.get("detail").and_then(|v| v.as_str()).map(str::to_string),
        }),
        "error" => Some(LogEvent::Error {
            message: value.get("message")?.as_str()?.to_string(),
        }),
        _ => None,
    }
}

static PLAIN_TEXT_ERROR_LINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^\s*error[:\s]+(.+)$").unwrap());

/// Some engines interleave plain-text diagnostics with the JSONL stream
/// rather than framing every line as JSON. Pull an `Error` event out of
/// such a line; returns `None` for anything that isn't recognizably an
/// error line, so normal non-JSON chatter is still silently dropped.
fn parse_plain_text_line(line: &str) -> Option<LogEvent> {
    let captures = PLAIN_TEXT_ERROR_LINE.captures(line)?;
    Some(LogEvent::Error { message: captures[1].trim().to_string() })
}

/// Claude emits `--output-format stream-json`: one JSON object per line,
/// already matching the common event shape.
pub struct ClaudeLogParser;

impl LogParser for ClaudeLogParser {
    fn parse(&self, log_text: &str) -> Vec<LogEvent> {
        log_text.lines().filter_map(|line| parse_jsonl_line(line).or_else(|| parse_plain_text_line(line))).collect()
    }
}

/// Codex's log is the same JSONL shape, wrapped one level deeper under a
/// `msg` field for some event kinds; unwrap before falling back to the
/// common parse.
pub struct CodexLogParser;

impl LogParser for CodexLogParser {
    fn parse(&self, log_text: &str) -> Vec<LogEvent> {
        log_text
            .lines()
            .filter_map(|line| {
                let Ok(value) = serde_json::from_str::<serde_json::Value>(line) else {
                    return parse_plain_text_line(line);
                };
                let inner = value.get("msg").cloned().unwrap_or(value);
                parse_jsonl_line(&inner.to_string())
            })
            .collect()
    }
}

/// Copilot CLI's JSONL stream uses the same common shape as Claude's.
pub struct CopilotLogParser;

impl LogParser for CopilotLogParser {
    fn parse(&self, log_text: &str) -> Vec<LogEvent> {
        log_text.lines().filter_map(|line| parse_jsonl_line(line).or_else(|| parse_plain_text_line(line))).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claude_parser_reads_tool_call_lines() {
        let log = "{\"type\":\"tool_call\",\"name\":\"bash\"}\n{\"type\":\"mcp_status\",\"server\":\"github\",\"ok\":true}\n";
        let events = ClaudeLogParser.parse(log);
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], LogEvent::ToolCall { .. }));
    }

    #[test]
    fn codex_parser_unwraps_msg_field() {
        let log = "{\"msg\":{\"type\":\"tool_call\",\"name\":\"apply_patch\"}}\n";
        let events = CodexLogParser.parse(log);
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], LogEvent::ToolCall { name } if name == "apply_patch"));
    }

    #[test]
    fn plain_text_error_lines_are_captured() {
        let log = "Error: connection to MCP server timed out\n{\"type\":\"tool_call\",\"name\":\"bash\"}\n";
        let events = ClaudeLogParser.parse(log);
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], LogEvent::Error { message } if message.contains("timed out")));
    }

    #[test]
    fn malformed_lines_are_skipped_not_fatal() {
        let log = "not json\n{\"type\":\"tool_call\",\"name\":\"bash\"}\n";
        let events = ClaudeLogParser.parse(log);
        assert_eq!(events.len(), 1);
    }
}
