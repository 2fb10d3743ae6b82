use super::Engine;
use crate::lock::Step;
use crate::tools::ResolvedToolset;
use gh_aw_schema::EngineSpec;

pub struct ClaudeEngine;

impl Engine for ClaudeEngine {
    fn id(&self) -> &'static str {
        "claude"
    }

    fn display_name(&self) -> &'static str {
        "Claude"
    }

    fn is_experimental(&self) -> bool {
        false
    }

    fn supports_tools_allowlist(&self) -> bool {
        true
    }

    fn supports_http_transport(&self) -> bool {
        true
    }

    fn supports_max_turns(&self) -> bool {
        true
    }

    fn installation_steps(&self, spec: &EngineSpec) -> Vec<Step> {
        let version = spec.version.clone().unwrap_or_else(|| "latest".to_string());
        vec![Step::run(
            "Install Claude CLI",
            format!("npm install -g @anthropic-ai/claude-code@{version}"),
        )]
    }

    fn execution_steps(&self, spec: &EngineSpec, toolset: &ResolvedToolset, log_path: &str) -> Vec<Step> {
        let allowed_tools: Vec<String> = toolset.mcp_servers.iter().map(|s| s.id.clone()).collect();
        let mut step = Step::run(
            "Run Claude",
            format!("claude --mcp-config mcp-servers.json --output-format stream-json > {log_path}"),
        )
        .with_param("allowed_tools", allowed_tools.join(","));
        if let Some(model) = &spec.model {
            step = step.with_env("ANTHROPIC_MODEL", model.clone());
        }
        if let Some(max_turns) = spec.max_turns {
            step = step.with_env("CLAUDE_MAX_TURNS", max_turns.to_string());
        }
        vec![step]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claude_supports_tools_allowlist_and_max_turns() {
        let engine = ClaudeEngine;
        assert!(engine.supports_tools_allowlist());
        assert!(engine.supports_max_turns());
        assert!(!engine.is_experimental());
    }
}
