//! Server configuration read from the agent job's environment.

use std::collections::BTreeSet;
use std::path::PathBuf;

/// Knobs the safe-outputs server reads from its process environment, set
/// by the compiled agent job alongside the MCP server launch step.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub output_path: PathBuf,
    pub patch_path: Option<PathBuf>,
    pub assets_dir: Option<PathBuf>,
    pub enabled_tools: BTreeSet<String>,
    pub staged: bool,
    pub push_target: Option<String>,
    pub push_if_no_changes: IfNoChanges,
    pub max_patch_size_kb: u32,
    pub pr_title_prefix: Option<String>,
    pub pr_labels: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IfNoChanges {
    Warn,
    Ignore,
    #[default]
    Error,
}

impl IfNoChanges {
    fn parse(raw: &str) -> Self {
        match raw {
            "warn" => IfNoChanges::Warn,
            "ignore" => IfNoChanges::Ignore,
            _ => IfNoChanges::Error,
        }
    }
}

const DEFAULT_MAX_PATCH_SIZE_KB: u32 = 1024;

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let output_path = std::env::var("GITHUB_AW_SAFE_OUTPUTS")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("safe-outputs.jsonl"));

        let enabled_tools = std::env::var("GITHUB_AW_SAFE_OUTPUTS_CONFIG")
            .ok()
            .and_then(|raw| serde_json::from_str::<serde_json::Value>(&raw).ok())
            .and_then(|value| value.as_object().cloned())
            .map(|map| map.keys().cloned().collect())
            .unwrap_or_default();

        let staged = std::env::var("GITHUB_AW_SAFE_OUTPUTS_STAGED")
            .map(|raw| raw == "true")
            .unwrap_or(false);

        let max_patch_size_kb = std::env::var("GITHUB_AW_MAX_PATCH_SIZE")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(DEFAULT_MAX_PATCH_SIZE_KB);

        let pr_labels = std::env::var("GITHUB_AW_PR_LABELS")
            .ok()
            .map(|raw| raw.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect())
            .unwrap_or_default();

        Ok(ServerConfig {
            patch_path: std::env::var("GITHUB_AW_PATCH_PATH").ok().map(PathBuf::from),
            assets_dir: std::env::var("GITHUB_AW_ASSETS_DIR").ok().map(PathBuf::from),
            enabled_tools,
            staged,
            push_target: std::env::var("GITHUB_AW_PUSH_TARGET").ok(),
            push_if_no_changes: std::env::var("GITHUB_AW_PUSH_IF_NO_CHANGES")
                .map(|raw| IfNoChanges::parse(&raw))
                .unwrap_or_default(),
            max_patch_size_kb,
            pr_title_prefix: std::env::var("GITHUB_AW_PR_TITLE_PREFIX").ok(),
            pr_labels,
            output_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn if_no_changes_defaults_to_error() {
        assert_eq!(IfNoChanges::parse("bogus"), IfNoChanges::Error);
        assert_eq!(IfNoChanges::parse("warn"), IfNoChanges::Warn);
    }
}
