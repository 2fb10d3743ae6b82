//! Per-engine agent log parsing: turns a raw agent log (JSONL, or JSONL
//! mixed with other stream framing depending on the engine) into a
//! normalized event list, then renders a markdown step summary and a
//! pass/fail verdict (any MCP server that failed to launch fails the job).
//! The `audit` batch entry point reprocesses many runs' saved logs for
//! cross-run analysis.

pub mod parsers;
pub mod report;

pub use parsers::{ClaudeLogParser, CodexLogParser, CopilotLogParser, LogParser};
pub use report::{AuditReport, LogEvent, McpServerStatus, RunSummary};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("failed to read log file {path}")]
    ReadFailure { path: String, #[source] source: std::io::Error },
}

pub type Result<T> = std::result::Result<T, AuditError>;

/// Parse one run's log with the parser matching `engine_id` (falling back
/// to a permissive JSONL scan for unknown ids) and summarize it.
pub fn summarize_run(engine_id: &str, log_text: &str) -> RunSummary {
    let parser: Box<dyn LogParser> = match engine_id {
        "claude" => Box::new(ClaudeLogParser),
        "codex" => Box::new(CodexLogParser),
        "copilot" => Box::new(CopilotLogParser),
        _ => Box::new(ClaudeLogParser),
    };
    let events = parser.parse(log_text);
    RunSummary::from_events(&events)
}

/// Reprocess every `*.log`/`*.jsonl` file directly under `dir`, keyed by
/// file stem, for cross-run analysis.
pub fn audit_directory(dir: &std::path::Path, engine_id: &str) -> Result<AuditReport> {
    let mut summaries = Vec::new();
    let entries = std::fs::read_dir(dir).map_err(|source| AuditError::ReadFailure {
        path: dir.display().to_string(),
        source,
    })?;
    for entry in entries.flatten() {
        let path = entry.path();
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            continue;
        };
        if ext != "log" && ext != "jsonl" {
            continue;
        }
        let text = std::fs::read_to_string(&path).map_err(|source| AuditError::ReadFailure {
            path: path.display().to_string(),
            source,
        })?;
        let run_id = path.file_stem().and_then(|s| s.to_str()).unwrap_or("run").to_string();
        summaries.push((run_id, summarize_run(engine_id, &text)));
    }
    Ok(AuditReport { runs: summaries })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn audit_directory_collects_every_log_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("run1.jsonl"), "{\"type\":\"tool_call\",\"name\":\"bash\"}\n").unwrap();
        fs::write(dir.path().join("run2.jsonl"), "{\"type\":\"tool_call\",\"name\":\"bash\"}\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignore me").unwrap();

        let report = audit_directory(dir.path(), "claude").unwrap();
        assert_eq!(report.runs.len(), 2);
    }
}
