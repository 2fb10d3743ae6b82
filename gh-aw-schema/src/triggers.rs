//! `TriggerSet`: the normalized `on:` section.

use serde::{Deserialize, Serialize};

/// A command trigger, either the bare `/command` shorthand or the full
/// object form with an explicit name and events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "CommandTriggerWire", into = "CommandTriggerWire")]
pub struct CommandTrigger {
    pub name: String,
    pub events: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum CommandTriggerWire {
    Bare(String),
    Full {
        name: String,
        #[serde(default)]
        events: Vec<String>,
    },
}

const DEFAULT_COMMAND_EVENTS: &[&str] = &["issue_comment", "pull_request_review_comment"];

impl From<CommandTriggerWire> for CommandTrigger {
    fn from(wire: CommandTriggerWire) -> Self {
        match wire {
            CommandTriggerWire::Bare(name) => CommandTrigger {
                name,
                events: DEFAULT_COMMAND_EVENTS.iter().map(|s| s.to_string()).collect(),
            },
            CommandTriggerWire::Full { name, events } if events.is_empty() => CommandTrigger {
                name,
                events: DEFAULT_COMMAND_EVENTS.iter().map(|s| s.to_string()).collect(),
            },
            CommandTriggerWire::Full { name, events } => CommandTrigger { name, events },
        }
    }
}

impl From<CommandTrigger> for CommandTriggerWire {
    fn from(trigger: CommandTrigger) -> Self {
        CommandTriggerWire::Full {
            name: trigger.name,
            events: trigger.events,
        }
    }
}

/// `reaction:` — the emoji reaction posted on the triggering comment while
/// the workflow runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionConfig {
    pub emoji: String,
}

impl Default for ReactionConfig {
    fn default() -> Self {
        ReactionConfig {
            emoji: "eyes".to_string(),
        }
    }
}

/// `roles:` — a repo-permission role allowed to invoke a command trigger or
/// approve a gated run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RolesConfig {
    Admin,
    Maintainer,
    Write,
    Triage,
    All,
}

impl Default for RolesConfig {
    fn default() -> Self {
        RolesConfig::Write
    }
}

/// The full `roles:` gate: one or more roles, any of which grants access.
/// Accepts either a bare role (`roles: admin`) or a list (`roles: [admin,
/// maintainer]`) on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RolesWire", into = "RolesWire")]
pub struct RolesGate(pub Vec<RolesConfig>);

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RolesWire {
    One(RolesConfig),
    Many(Vec<RolesConfig>),
}

impl From<RolesWire> for RolesGate {
    fn from(wire: RolesWire) -> Self {
        match wire {
            RolesWire::One(role) => RolesGate(vec![role]),
            RolesWire::Many(roles) => RolesGate(roles),
        }
    }
}

impl From<RolesGate> for RolesWire {
    fn from(gate: RolesGate) -> Self {
        match gate.0.as_slice() {
            [single] => RolesWire::One(*single),
            _ => RolesWire::Many(gate.0),
        }
    }
}

impl Default for RolesGate {
    fn default() -> Self {
        RolesGate(vec![RolesConfig::default()])
    }
}

/// The normalized `on:` section: the raw GitHub event map, plus the
/// gh-aw-specific extensions layered on top of it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriggerSet {
    /// Raw GitHub Actions event triggers (`push`, `pull_request`,
    /// `schedule`, `workflow_dispatch`, ...), passed through unmodified.
    #[serde(flatten)]
    pub events: std::collections::BTreeMap<String, serde_yaml::Value>,
    #[serde(default)]
    pub command: Option<CommandTrigger>,
    #[serde(default)]
    pub reaction: Option<ReactionConfig>,
    #[serde(default)]
    pub roles: Option<RolesGate>,
    #[serde(default, rename = "stop-after")]
    pub stop_after: Option<String>,
    #[serde(default, rename = "skip-if-match")]
    pub skip_if_match: Option<String>,
}

/// A single emitted GitHub Actions trigger event name, used by the compiler
/// when it needs to enumerate which raw events a `TriggerSet` resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerEvent(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_command_gets_default_events() {
        let trigger: CommandTrigger = serde_yaml::from_str("/triage").unwrap();
        assert_eq!(trigger.name, "/triage");
        assert_eq!(trigger.events, DEFAULT_COMMAND_EVENTS.to_vec());
    }

    #[test]
    fn full_command_keeps_explicit_events() {
        let yaml = "name: /triage\nevents: [issue_comment]\n";
        let trigger: CommandTrigger = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(trigger.events, vec!["issue_comment".to_string()]);
    }

    #[test]
    fn trigger_set_keeps_raw_events_alongside_command() {
        let yaml = "push:\n  branches: [main]\ncommand: /triage\n";
        let set: TriggerSet = serde_yaml::from_str(yaml).unwrap();
        assert!(set.events.contains_key("push"));
        assert_eq!(set.command.unwrap().name, "/triage");
    }

    #[test]
    fn bare_role_gate_wraps_a_single_role() {
        let gate: RolesGate = serde_yaml::from_str("maintainer\n").unwrap();
        assert_eq!(gate.0, vec![RolesConfig::Maintainer]);
    }

    #[test]
    fn list_role_gate_keeps_every_role() {
        let gate: RolesGate = serde_yaml::from_str("[admin, triage]\n").unwrap();
        assert_eq!(gate.0, vec![RolesConfig::Admin, RolesConfig::Triage]);
    }

    #[test]
    fn trigger_set_parses_triage_role() {
        let yaml = "issue_comment: {}\nroles: triage\n";
        let set: TriggerSet = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(set.roles.unwrap().0, vec![RolesConfig::Triage]);
    }
}
