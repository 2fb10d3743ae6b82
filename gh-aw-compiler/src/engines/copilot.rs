use super::Engine;
use crate::lock::Step;
use crate::tools::ResolvedToolset;
use gh_aw_schema::EngineSpec;

/// Copilot takes its MCP config as a JSON file path rather than inline
/// YAML, and has no `max-turns` equivalent to wire up.
pub struct CopilotEngine;

impl Engine for CopilotEngine {
    fn id(&self) -> &'static str {
        "copilot"
    }

    fn display_name(&self) -> &'static str {
        "GitHub Copilot"
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
        false
    }

    fn installation_steps(&self, _spec: &EngineSpec) -> Vec<Step> {
        vec![Step::run("Install Copilot CLI", "npm install -g @github/copilot-cli")]
    }

    fn execution_steps(&self, spec: &EngineSpec, toolset: &ResolvedToolset, log_path: &str) -> Vec<Step> {
        let allowed_tools: Vec<String> = toolset.mcp_servers.iter().map(|s| s.id.clone()).collect();
        let mut step = Step::run(
            "Run Copilot",
            format!("copilot --additional-mcp-config mcp-servers.json --agent-label gh-aw > {log_path}"),
        )
        .with_param("allowed_tools", allowed_tools.join(","));
        if let Some(model) = &spec.model {
            step = step.with_env("COPILOT_MODEL", model.clone());
        }
        vec![step]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copilot_has_no_max_turns_support() {
        let engine = CopilotEngine;
        assert!(!engine.supports_max_turns());
        assert!(engine.supports_tools_allowlist());
    }
}
