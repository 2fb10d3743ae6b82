use super::Engine;
use crate::lock::Step;
use crate::tools::ResolvedToolset;
use gh_aw_schema::EngineSpec;

/// Codex is gated behind `is_experimental`: the activation job and docs
/// surface a warning, but compilation proceeds identically otherwise.
pub struct CodexEngine;

impl Engine for CodexEngine {
    fn id(&self) -> &'static str {
        "codex"
    }

    fn display_name(&self) -> &'static str {
        "Codex"
    }

    fn is_experimental(&self) -> bool {
        true
    }

    fn supports_tools_allowlist(&self) -> bool {
        false
    }

    fn supports_http_transport(&self) -> bool {
        false
    }

    fn supports_max_turns(&self) -> bool {
        true
    }

    fn installation_steps(&self, spec: &EngineSpec) -> Vec<Step> {
        let version = spec.version.clone().unwrap_or_else(|| "latest".to_string());
        vec![Step::run("Install Codex CLI", format!("npm install -g @openai/codex@{version}"))]
    }

    fn execution_steps(&self, spec: &EngineSpec, _toolset: &ResolvedToolset, log_path: &str) -> Vec<Step> {
        let mut config_toml = String::from("[codex]\n");
        if let Some(model) = &spec.model {
            config_toml.push_str(&format!("model = \"{model}\"\n"));
        }
        if let Some(max_turns) = spec.max_turns {
            config_toml.push_str(&format!("max_turns = {max_turns}\n"));
        }
        vec![
            Step::run("Write Codex config", format!("cat > codex-config.toml <<'EOF'\n{config_toml}EOF")),
            Step::run("Run Codex", format!("codex exec --config codex-config.toml > {log_path}")),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codex_is_experimental_and_has_no_tools_allowlist() {
        let engine = CodexEngine;
        assert!(engine.is_experimental());
        assert!(!engine.supports_tools_allowlist());
        assert!(!engine.supports_http_transport());
    }
}
