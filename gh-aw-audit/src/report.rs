//! Normalized log events and the markdown/verdict summary built from them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LogEvent {
    ToolCall { name: String },
    McpServerStatus { server: String, ok: bool, detail: Option<String> },
    Error { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum McpServerStatus {
    Launched,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub tool_call_histogram: BTreeMap<String, u32>,
    pub mcp_servers: BTreeMap<String, McpServerStatus>,
    pub first_errors: Vec<String>,
}

const MAX_ERRORS_IN_SUMMARY: usize = 10;

impl RunSummary {
    pub fn from_events(events: &[LogEvent]) -> Self {
        let mut tool_call_histogram = BTreeMap::new();
        let mut mcp_servers = BTreeMap::new();
        let mut first_errors = Vec::new();

        for event in events {
            match event {
                LogEvent::ToolCall { name } => {
                    *tool_call_histogram.entry(name.clone()).or_insert(0) += 1;
                }
                LogEvent::McpServerStatus { server, ok, .. } => {
                    let status = if *ok { McpServerStatus::Launched } else { McpServerStatus::Failed };
                    mcp_servers.insert(server.clone(), status);
                }
                LogEvent::Error { message } => {
                    if first_errors.len() < MAX_ERRORS_IN_SUMMARY {
                        first_errors.push(message.clone());
                    }
                }
            }
        }

        Self {
            tool_call_histogram,
            mcp_servers,
            first_errors,
        }
    }

    /// Any MCP server failing to launch fails the job, per the agent
    /// step's post-run check.
    pub fn any_mcp_server_failed(&self) -> bool {
        self.mcp_servers.values().any(|status| *status == McpServerStatus::Failed)
    }

    pub fn to_step_summary_markdown(&self) -> String {
        let mut out = String::from("### Agent run summary\n\n");
        if !self.mcp_servers.is_empty() {
            out.push_str("**MCP servers**\n\n");
            for (server, status) in &self.mcp_servers {
                let mark = if *status == McpServerStatus::Launched { "✅" } else { "❌" };
                out.push_str(&format!("- {mark} `{server}`\n"));
            }
            out.push('\n');
        }
        if !self.tool_call_histogram.is_empty() {
            out.push_str("**Tool calls**\n\n");
            let mut counts: Vec<(&String, &u32)> = self.tool_call_histogram.iter().collect();
            counts.sort_by(|a, b| b.1.cmp(a.1));
            for (name, count) in counts {
                out.push_str(&format!("- `{name}`: {count}\n"));
            }
            out.push('\n');
        }
        if !self.first_errors.is_empty() {
            out.push_str("**Errors**\n\n");
            for error in &self.first_errors {
                out.push_str(&format!("- {error}\n"));
            }
        }
        out
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditReport {
    pub runs: Vec<(String, RunSummary)>,
}

impl AuditReport {
    pub fn total_tool_calls(&self) -> u32 {
        self.runs.iter().flat_map(|(_, summary)| summary.tool_call_histogram.values()).sum()
    }

    pub fn runs_with_failed_mcp_servers(&self) -> Vec<&str> {
        self.runs
            .iter()
            .filter(|(_, summary)| summary.any_mcp_server_failed())
            .map(|(id, _)| id.as_str())
            .collect()
    }
}
