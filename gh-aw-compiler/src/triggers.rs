//! Trigger compiler: materializes `on:` into the lock file's raw GitHub
//! Actions trigger map, and builds the activation job that gates
//! `roles:`, `command:`, `stop-after:`, `skip-if-match:`, and posts the
//! configured `reaction:`.

use crate::lock::{Job, Step};
use gh_aw_schema::{ReactionConfig, RolesConfig, RolesGate, TriggerSet};
use serde_yaml::Value;

/// The raw `on:` block: every declared GitHub event passed through
/// unmodified, since gh-aw's extensions (`command`, `reaction`, `roles`,
/// `stop-after`, `skip-if-match`) are compiled separately into the
/// activation job rather than emitted as trigger keys themselves.
pub fn compile_on_block(triggers: &TriggerSet) -> Value {
    let mut map = serde_yaml::Mapping::new();
    for (event, config) in &triggers.events {
        map.insert(event.clone().into(), config.clone());
    }
    if triggers.command.is_some() && !map.contains_key("issue_comment") {
        map.insert(
            "issue_comment".into(),
            Value::Mapping({
                let mut m = serde_yaml::Mapping::new();
                m.insert("types".into(), Value::Sequence(vec!["created".into()]));
                m
            }),
        );
    }
    Value::Mapping(map)
}

fn single_role_condition(role: RolesConfig) -> Option<String> {
    match role {
        RolesConfig::All => None,
        RolesConfig::Admin => Some("github.event.sender.permission == 'admin'".to_string()),
        RolesConfig::Maintainer => Some(
            "contains(fromJson('[\"admin\",\"maintain\"]'), github.event.sender.permission)".to_string(),
        ),
        RolesConfig::Write => Some(
            "contains(fromJson('[\"admin\",\"write\",\"maintain\"]'), github.event.sender.permission)".to_string(),
        ),
        RolesConfig::Triage => Some(
            "contains(fromJson('[\"admin\",\"write\",\"maintain\",\"triage\"]'), github.event.sender.permission)".to_string(),
        ),
    }
}

/// Any role in the gate being satisfied is sufficient; `All` in the set
/// short-circuits to no condition at all.
fn roles_condition(roles: &RolesGate) -> Option<String> {
    if roles.0.iter().any(|role| *role == RolesConfig::All) {
        return None;
    }
    let conditions: Vec<String> = roles.0.iter().copied().filter_map(single_role_condition).collect();
    match conditions.len() {
        0 => None,
        1 => conditions.into_iter().next(),
        _ => Some(format!("({})", conditions.join(" || "))),
    }
}

/// Matches the command name at the start of the comment body or right
/// after a newline — an approximation of "recognized position" that a
/// single `if:` expression can express; it does not special-case leading
/// whitespace on the command's own line.
fn command_condition(triggers: &TriggerSet) -> Option<String> {
    let command = triggers.command.as_ref()?;
    Some(format!(
        "(startsWith(github.event.comment.body, '{name}') || contains(github.event.comment.body, format('\\n{name}')))",
        name = command.name
    ))
}

/// Build the activation job: it runs first, gates on roles/command/stop-
/// after/skip-if-match, posts the configured reaction, and exports the
/// sanitized triggering text as `outputs.text` for the agent prompt.
pub fn build_activation_job(triggers: &TriggerSet) -> Job {
    let mut conditions = Vec::new();
    if let Some(roles) = &triggers.roles {
        if let Some(condition) = roles_condition(roles) {
            conditions.push(condition);
        }
    }
    if let Some(condition) = command_condition(triggers) {
        conditions.push(condition);
    }

    let mut job = Job::new("ubuntu-latest").permission("contents", "read");
    if !conditions.is_empty() {
        job = job.if_condition(conditions.join(" && "));
    }

    if let Some(stop_after) = &triggers.stop_after {
        job = job.step(Step::run(
            "Check stop-after deadline",
            format!("if [ \"$(date -u +%s)\" -ge \"$(date -u -d '{stop_after}' +%s)\" ]; then echo 'deadline passed'; exit 1; fi"),
        ));
    }

    if let Some(query) = &triggers.skip_if_match {
        job = job.step(Step::run(
            "Evaluate skip-if-match",
            format!("gh search issues '{query}' --json number --jq 'length' | grep -q '^0$'"),
        ));
    }

    let reaction = triggers.reaction.clone().unwrap_or_default();
    job = job.step(build_reaction_step(&reaction));

    job.step(Step::run(
        "Export sanitized trigger text",
        "echo \"text=$(cat trigger_body.txt | head -c 65536)\" >> \"$GITHUB_OUTPUT\"".to_string(),
    ))
    .output("text", "${{ steps.export_text.outputs.text }}")
}

fn build_reaction_step(reaction: &ReactionConfig) -> Step {
    Step::run(
        "Add reaction",
        format!("gh api repos/${{{{ github.repository }}}}/issues/comments/${{{{ github.event.comment.id }}}}/reactions -f content='{}'", reaction.emoji),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use gh_aw_schema::CommandTrigger;

    #[test]
    fn command_trigger_adds_issue_comment_event() {
        let mut triggers = TriggerSet::default();
        triggers.command = Some(CommandTrigger {
            name: "/triage".to_string(),
            events: vec!["issue_comment".to_string()],
        });
        let on_block = compile_on_block(&triggers);
        assert!(on_block.get("issue_comment").is_some());
    }

    #[test]
    fn write_role_produces_permission_condition() {
        let condition = roles_condition(&RolesGate(vec![RolesConfig::Write])).unwrap();
        assert!(condition.contains("sender.permission"));
    }

    #[test]
    fn all_role_has_no_condition() {
        assert!(roles_condition(&RolesGate(vec![RolesConfig::All])).is_none());
    }

    #[test]
    fn triage_role_includes_triage_permission() {
        let condition = roles_condition(&RolesGate(vec![RolesConfig::Triage])).unwrap();
        assert!(condition.contains("triage"));
    }

    #[test]
    fn multiple_roles_combine_with_or() {
        let condition = roles_condition(&RolesGate(vec![RolesConfig::Admin, RolesConfig::Triage])).unwrap();
        assert!(condition.contains("||"));
    }

    #[test]
    fn any_all_in_the_gate_clears_the_condition() {
        assert!(roles_condition(&RolesGate(vec![RolesConfig::Admin, RolesConfig::All])).is_none());
    }

    #[test]
    fn activation_job_exports_text_output() {
        let triggers = TriggerSet::default();
        let job = build_activation_job(&triggers);
        assert!(job.outputs.iter().any(|(name, _)| name == "text"));
    }
}
