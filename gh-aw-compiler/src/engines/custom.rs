use super::Engine;
use crate::lock::Step;
use crate::tools::ResolvedToolset;
use gh_aw_schema::EngineSpec;

/// The escape hatch: passes the author's own `engine.steps` through
/// verbatim and wires up no MCP servers at all.
pub struct CustomEngine;

impl Engine for CustomEngine {
    fn id(&self) -> &'static str {
        "custom"
    }

    fn display_name(&self) -> &'static str {
        "Custom"
    }

    fn is_experimental(&self) -> bool {
        false
    }

    fn supports_tools_allowlist(&self) -> bool {
        false
    }

    fn supports_http_transport(&self) -> bool {
        false
    }

    fn supports_max_turns(&self) -> bool {
        false
    }

    fn installation_steps(&self, _spec: &EngineSpec) -> Vec<Step> {
        Vec::new()
    }

    fn execution_steps(&self, spec: &EngineSpec, _toolset: &ResolvedToolset, _log_path: &str) -> Vec<Step> {
        spec.steps
            .iter()
            .filter_map(|raw| {
                let mapping = raw.as_mapping()?;
                let name = mapping.get("name").and_then(|v| v.as_str()).unwrap_or("Custom step");
                let mut step = if let Some(run) = mapping.get("run").and_then(|v| v.as_str()) {
                    Step::run(name, run)
                } else if let Some(uses) = mapping.get("uses").and_then(|v| v.as_str()) {
                    Step::uses(name, uses)
                } else {
                    Step::run(name, "")
                };
                if let Some(id) = mapping.get("id").and_then(|v| v.as_str()) {
                    step = step.with_id(id);
                }
                Some(step)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_engine_passes_through_user_steps() {
        let spec = EngineSpec {
            steps: vec![serde_yaml::from_str("name: Build\nrun: cargo build").unwrap()],
            ..Default::default()
        };
        let engine = CustomEngine;
        let toolset = ResolvedToolset {
            mcp_servers: Vec::new(),
            native_flags: Vec::new(),
        };
        let steps = engine.execution_steps(&spec, &toolset, "log.txt");
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].name.as_deref(), Some("Build"));
    }

    #[test]
    fn custom_engine_has_no_installation_steps() {
        let engine = CustomEngine;
        assert!(engine.installation_steps(&EngineSpec::default()).is_empty());
    }
}
