//! Validating `${{ … }}` expressions in a Markdown body against the
//! allow-list of identifiers an agent prompt may reference.

use crate::errors::{FrontmatterError, Result};
use regex::Regex;
use std::sync::LazyLock;

static EXPRESSION_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\$\{\{\s*(.+?)\s*\}\}").unwrap());

const EXACT_ALLOWED: &[&str] = &[
    "github.actor",
    "github.job",
    "github.owner",
    "github.repository",
    "github.run_id",
    "github.run_number",
    "github.server_url",
    "github.workflow",
    "github.workspace",
];

const EVENT_PATH_ALLOWED: &[&str] = &[
    "github.event.after",
    "github.event.before",
    "github.event.check_run.id",
    "github.event.check_suite.id",
    "github.event.comment.id",
    "github.event.deployment.id",
    "github.event.deployment_status.id",
    "github.event.head_commit.id",
    "github.event.installation.id",
    "github.event.issue.number",
    "github.event.label.id",
    "github.event.milestone.id",
    "github.event.organization.id",
    "github.event.page.id",
    "github.event.project.id",
    "github.event.project_card.id",
    "github.event.project_column.id",
    "github.event.pull_request.number",
    "github.event.release.assets[0].id",
    "github.event.release.id",
    "github.event.release.tag_name",
    "github.event.repository.id",
    "github.event.review.id",
    "github.event.review_comment.id",
    "github.event.sender.id",
    "github.event.workflow_run.id",
    "github.event.workflow_run.conclusion",
    "github.event.workflow_run.html_url",
    "github.event.workflow_run.head_sha",
    "github.event.workflow_run.run_number",
    "github.event.workflow_run.event",
    "github.event.workflow_run.status",
];

const GLOB_PREFIXES: &[&str] = &["needs.", "steps.", "github.event.inputs."];

fn is_allowed_identifier(identifier: &str) -> bool {
    if EXACT_ALLOWED.contains(&identifier) || EVENT_PATH_ALLOWED.contains(&identifier) {
        return true;
    }
    GLOB_PREFIXES.iter().any(|prefix| identifier.starts_with(prefix))
}

/// Strip a leading unary/boolean/object-access wrapper and return the bare
/// dotted identifier path an expression references, e.g. `!github.actor`
/// or `github.actor == 'x'` both yield `github.actor`.
fn extract_identifier(expr: &str) -> Option<String> {
    let ident_re = Regex::new(r"[A-Za-z_][A-Za-z0-9_.\[\]'\"]*").unwrap();
    ident_re.find(expr.trim_start_matches('!').trim()).map(|m| m.as_str().to_string())
}

/// Returns every identifier referenced inside `${{ … }}` expressions that
/// is not on the allow-list. An empty result means the body is clean.
pub fn find_unauthorized_expressions(body: &str) -> Vec<String> {
    let mut offenders = Vec::new();
    for caps in EXPRESSION_REGEX.captures_iter(body) {
        let expr = caps[1].trim();
        if let Some(identifier) = extract_identifier(expr) {
            if !is_allowed_identifier(&identifier) {
                offenders.push(identifier);
            }
        } else if !expr.is_empty() {
            offenders.push(expr.to_string());
        }
    }
    offenders
}

/// Validate `body`, failing with [`FrontmatterError::UnauthorizedExpression`]
/// naming every offending identifier if any are found.
pub fn validate_expressions(body: &str) -> Result<()> {
    let offenders = find_unauthorized_expressions(body);
    if offenders.is_empty() {
        Ok(())
    } else {
        Err(FrontmatterError::UnauthorizedExpression { identifiers: offenders })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_exact_github_context_fields() {
        assert!(validate_expressions("Run as ${{ github.actor }} in ${{ github.repository }}").is_ok());
    }

    #[test]
    fn allows_event_path_and_glob_patterns() {
        let body = "Issue #${{ github.event.issue.number }} from ${{ needs.setup.outputs.value }}";
        assert!(validate_expressions(body).is_ok());
    }

    #[test]
    fn rejects_secrets_reference() {
        let offenders = find_unauthorized_expressions("key: ${{ secrets.API_KEY }}");
        assert_eq!(offenders, vec!["secrets.API_KEY".to_string()]);
    }

    #[test]
    fn rejects_function_calls() {
        let offenders = find_unauthorized_expressions("${{ toJson(github.event) }}");
        assert_eq!(offenders, vec!["toJson".to_string()]);
    }

    #[test]
    fn rejects_env_and_vars() {
        let body = "${{ env.FOO }} ${{ vars.BAR }}";
        let offenders = find_unauthorized_expressions(body);
        assert_eq!(offenders, vec!["env.FOO".to_string(), "vars.BAR".to_string()]);
    }
}
