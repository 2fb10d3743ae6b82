//! `EngineSpec`: the coding-agent engine configuration for a workflow.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EngineId {
    Claude,
    Codex,
    Copilot,
    Custom,
}

impl EngineId {
    pub fn as_str(self) -> &'static str {
        match self {
            EngineId::Claude => "claude",
            EngineId::Codex => "codex",
            EngineId::Copilot => "copilot",
            EngineId::Custom => "custom",
        }
    }
}

/// `engine:` section, or the shorthand bare engine id string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "EngineSpecWire", into = "EngineSpecWire")]
pub struct EngineSpec {
    pub id: EngineId,
    pub model: Option<String>,
    pub version: Option<String>,
    pub args: Vec<String>,
    pub env: BTreeMap<String, String>,
    pub max_turns: Option<u32>,
    pub max_concurrency: Option<u32>,
    pub timeout: Option<u32>,
    pub startup_timeout: Option<u32>,
    pub steps: Vec<serde_yaml::Value>,
    pub mode: Option<String>,
}

impl Default for EngineSpec {
    fn default() -> Self {
        Self {
            id: EngineId::Claude,
            model: None,
            version: None,
            args: Vec::new(),
            env: BTreeMap::new(),
            max_turns: None,
            max_concurrency: None,
            timeout: None,
            startup_timeout: None,
            steps: Vec::new(),
            mode: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum EngineSpecWire {
    Bare(String),
    Full {
        id: EngineId,
        #[serde(default)]
        model: Option<String>,
        #[serde(default)]
        version: Option<String>,
        #[serde(default)]
        args: Vec<String>,
        #[serde(default)]
        env: BTreeMap<String, String>,
        #[serde(default, rename = "max-turns")]
        max_turns: Option<u32>,
        #[serde(default, rename = "max-concurrency")]
        max_concurrency: Option<u32>,
        #[serde(default)]
        timeout: Option<u32>,
        #[serde(default, rename = "startup-timeout")]
        startup_timeout: Option<u32>,
        #[serde(default)]
        steps: Vec<serde_yaml::Value>,
        #[serde(default)]
        mode: Option<String>,
    },
}

impl From<EngineSpecWire> for EngineSpec {
    fn from(wire: EngineSpecWire) -> Self {
        match wire {
            EngineSpecWire::Bare(id_str) => EngineSpec {
                id: parse_engine_id(&id_str),
                ..EngineSpec::default()
            },
            EngineSpecWire::Full {
                id,
                model,
                version,
                args,
                env,
                max_turns,
                max_concurrency,
                timeout,
                startup_timeout,
                steps,
                mode,
            } => EngineSpec {
                id,
                model,
                version,
                args,
                env,
                max_turns,
                max_concurrency,
                timeout,
                startup_timeout,
                steps,
                mode,
            },
        }
    }
}

impl From<EngineSpec> for EngineSpecWire {
    fn from(spec: EngineSpec) -> Self {
        EngineSpecWire::Full {
            id: spec.id,
            model: spec.model,
            version: spec.version,
            args: spec.args,
            env: spec.env,
            max_turns: spec.max_turns,
            max_concurrency: spec.max_concurrency,
            timeout: spec.timeout,
            startup_timeout: spec.startup_timeout,
            steps: spec.steps,
            mode: spec.mode,
        }
    }
}

fn parse_engine_id(value: &str) -> EngineId {
    match value {
        "codex" => EngineId::Codex,
        "copilot" => EngineId::Copilot,
        "custom" => EngineId::Custom,
        _ => EngineId::Claude,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_engine_string() {
        let spec: EngineSpec = serde_yaml::from_str("codex").unwrap();
        assert_eq!(spec.id, EngineId::Codex);
        assert!(spec.model.is_none());
    }

    #[test]
    fn parses_full_engine_object() {
        let yaml = "id: claude\nmodel: claude-opus-4\nmax-turns: 20\n";
        let spec: EngineSpec = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(spec.id, EngineId::Claude);
        assert_eq!(spec.model.as_deref(), Some("claude-opus-4"));
        assert_eq!(spec.max_turns, Some(20));
    }
}
