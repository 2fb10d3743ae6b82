//! Strict-mode validator: an author opt-in (or CLI flag) that enforces a
//! handful of rules a non-strict workflow is allowed to skip.

use crate::errors::CompileError;
use crate::tools::ResolvedToolset;
use gh_aw_schema::{FrontmatterTree, NetworkPolicy, Transport};

/// Run every strict-mode rule, returning every violation found rather than
/// failing fast, so the author sees the whole list at once.
pub fn validate_strict(tree: &FrontmatterTree, toolset: &ResolvedToolset, agent_permissions: &[(String, String)]) -> Vec<CompileError> {
    let mut violations = Vec::new();

    if tree.timeout_minutes.is_none() {
        violations.push(CompileError::StrictViolation {
            rule: "timeout-required".to_string(),
            message: "strict mode requires `timeout-minutes` to be set".to_string(),
        });
    }

    if agent_permissions.iter().any(|(_, level)| level == "write") {
        violations.push(CompileError::StrictViolation {
            rule: "no-agent-write".to_string(),
            message: "strict mode forbids write permissions on the agent job".to_string(),
        });
    }

    match &tree.network {
        None => violations.push(CompileError::StrictViolation {
            rule: "network-explicit".to_string(),
            message: "strict mode requires `network:` to be explicitly declared".to_string(),
        }),
        Some(policy) if policy.has_wildcard() => violations.push(CompileError::StrictViolation {
            rule: "no-network-wildcard".to_string(),
            message: "strict mode forbids wildcard entries in `network.allowed`".to_string(),
        }),
        Some(_) => {}
    }

    for server in &toolset.mcp_servers {
        if let Transport::Container(container) = &server.transport {
            let has_allowed = matches!(container.network, Some(NetworkPolicy::Allowed(_)));
            if !has_allowed {
                violations.push(CompileError::StrictViolation {
                    rule: "container-network-required".to_string(),
                    message: format!("strict mode requires `network.allowed` on containerized MCP server '{}'", server.id),
                });
            }
        }
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::resolve_tools;

    #[test]
    fn missing_timeout_is_a_violation() {
        let tree = FrontmatterTree {
            network: Some(NetworkPolicy::DenyAll),
            ..Default::default()
        };
        let toolset = resolve_tools(&tree).unwrap();
        let perms = crate::permissions::agent_permissions(&tree);
        let violations = validate_strict(&tree, &toolset, &perms);
        assert!(violations.iter().any(|v| matches!(v, CompileError::StrictViolation { rule, .. } if rule == "timeout-required")));
    }

    #[test]
    fn fully_compliant_tree_has_no_violations() {
        let tree = FrontmatterTree {
            timeout_minutes: Some(10),
            network: Some(NetworkPolicy::DenyAll),
            ..Default::default()
        };
        let toolset = resolve_tools(&tree).unwrap();
        let perms = crate::permissions::agent_permissions(&tree);
        let violations = validate_strict(&tree, &toolset, &perms);
        assert!(violations.is_empty());
    }
}
