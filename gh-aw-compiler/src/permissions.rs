//! Permission computation: the agent job gets the minimum read scopes the
//! prompt references; write scopes migrate to the safe-output jobs.

use gh_aw_schema::{FrontmatterTree, SafeOutputType};
use std::collections::BTreeSet;

/// Permission pairs `(scope, level)` for the agent job, derived from the
/// trigger set's event kinds. `contents: read` is always present.
pub fn agent_permissions(tree: &FrontmatterTree) -> Vec<(String, String)> {
    let mut scopes: BTreeSet<(String, String)> = BTreeSet::new();
    scopes.insert(("contents".to_string(), "read".to_string()));

    for event in tree.on.events.keys() {
        match event.as_str() {
            "issues" | "issue_comment" => {
                scopes.insert(("issues".to_string(), "read".to_string()));
            }
            "pull_request" | "pull_request_review_comment" => {
                scopes.insert(("pull-requests".to_string(), "read".to_string()));
            }
            "discussion" | "discussion_comment" => {
                scopes.insert(("discussions".to_string(), "read".to_string()));
            }
            _ => {}
        }
    }

    scopes.into_iter().collect()
}

/// Write scopes a given declared safe-output type adds, attached to that
/// type's own job rather than the agent job (invariant I2).
pub fn safe_output_write_scopes(kind: SafeOutputType) -> Vec<(&'static str, &'static str)> {
    match kind {
        SafeOutputType::CreateIssue | SafeOutputType::AddComment | SafeOutputType::UpdateIssue | SafeOutputType::AddLabels => {
            vec![("issues", "write"), ("pull-requests", "write")]
        }
        SafeOutputType::CreatePullRequest | SafeOutputType::CreatePullRequestReviewComment => {
            vec![("contents", "write"), ("pull-requests", "write")]
        }
        // Narrower than the PR-authoring types above: this job only pushes
        // a commit onto a branch that already has an open PR, so it never
        // needs to read pull-request metadata beyond what the validation
        // hook already covers.
        SafeOutputType::PushToPullRequestBranch => vec![("contents", "write"), ("pull-requests", "read")],
        SafeOutputType::CreateDiscussion => vec![("discussions", "write")],
        SafeOutputType::UpdateRelease => vec![("contents", "write")],
        SafeOutputType::CreateCodeScanningAlert => vec![("security-events", "write")],
        SafeOutputType::MissingTool | SafeOutputType::PublishAsset | SafeOutputType::Noop | SafeOutputType::CreateAgentTask => vec![],
    }
}
