//! `FrontmatterTree`: the fully merged, normalized frontmatter document a
//! compiled workflow is built from.

use crate::engine::EngineSpec;
use crate::network::NetworkPolicy;
use crate::safe_outputs::SafeOutputsSpec;
use crate::tools::ToolDecl;
use crate::triggers::{CommandTrigger, RolesGate, TriggerSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// All recognized top-level frontmatter keys, after import merging and
/// before tool/trigger/permission resolution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrontmatterTree {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Declared imports, merged away by the import resolver before this
    /// tree reaches later phases; kept here so round-tripping an
    /// unresolved document is still lossless.
    #[serde(default)]
    pub imports: Vec<String>,
    #[serde(default)]
    pub on: TriggerSet,
    #[serde(default)]
    pub permissions: BTreeMap<String, String>,
    #[serde(default, rename = "run-name")]
    pub run_name: Option<String>,
    #[serde(default, rename = "timeout-minutes")]
    pub timeout_minutes: Option<u32>,
    #[serde(default)]
    pub concurrency: Option<serde_yaml::Value>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    #[serde(default, rename = "runs-on")]
    pub runs_on: Option<serde_yaml::Value>,
    #[serde(default)]
    pub network: Option<NetworkPolicy>,
    #[serde(default)]
    pub engine: Option<EngineSpec>,
    #[serde(default)]
    pub tools: Vec<ToolDecl>,
    #[serde(default, rename = "mcp-servers")]
    pub mcp_servers: BTreeMap<String, ToolDecl>,
    #[serde(default, rename = "safe-outputs")]
    pub safe_outputs: Option<SafeOutputsSpec>,
    #[serde(default)]
    pub cache: Option<serde_yaml::Value>,
    #[serde(default, rename = "github-token")]
    pub github_token: Option<String>,
    #[serde(default)]
    pub steps: Vec<serde_yaml::Value>,
    #[serde(default, rename = "post-steps")]
    pub post_steps: Vec<serde_yaml::Value>,
    #[serde(default)]
    pub strict: bool,
    #[serde(default, rename = "source")]
    pub source: Option<String>,
    /// Top-level `command:` shorthand. Folded into `on.command` by
    /// [`Self::normalize_triggers`] before trigger compilation.
    #[serde(default)]
    pub command: Option<CommandTrigger>,
    /// Top-level `roles:` shorthand. Folded into `on.roles` by
    /// [`Self::normalize_triggers`] before trigger compilation.
    #[serde(default)]
    pub roles: Option<RolesGate>,
}

impl FrontmatterTree {
    pub fn has_command_trigger(&self) -> bool {
        self.on.command.is_some() || self.command.is_some()
    }

    pub fn safe_outputs_or_default(&self) -> SafeOutputsSpec {
        self.safe_outputs.clone().unwrap_or_default()
    }

    /// Move the top-level `command:`/`roles:` shorthand into the `on:`
    /// section, where the rest of the trigger compiler expects to find
    /// them. `on.command`/`on.roles`, if already present, take precedence.
    pub fn normalize_triggers(&mut self) {
        if self.on.command.is_none() {
            self.on.command = self.command.take();
        } else {
            self.command = None;
        }
        if self.on.roles.is_none() {
            self.on.roles = self.roles.take();
        } else {
            self.roles = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_document() {
        let yaml = "name: Triage\non:\n  push:\n    branches: [main]\n";
        let tree: FrontmatterTree = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(tree.name.as_deref(), Some("Triage"));
        assert!(tree.on.events.contains_key("push"));
        assert!(!tree.strict);
    }

    #[test]
    fn defaults_are_empty_not_missing() {
        let tree: FrontmatterTree = serde_yaml::from_str("name: x\n").unwrap();
        assert!(tree.tools.is_empty());
        assert!(tree.mcp_servers.is_empty());
        assert!(tree.safe_outputs.is_none());
    }

    #[test]
    fn normalize_triggers_moves_top_level_command_into_on() {
        let mut tree: FrontmatterTree = serde_yaml::from_str("command: /triage\n").unwrap();
        tree.normalize_triggers();
        assert!(tree.command.is_none());
        assert_eq!(tree.on.command.unwrap().name, "/triage");
    }
}
