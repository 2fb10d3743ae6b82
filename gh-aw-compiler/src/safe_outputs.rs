//! Safe-output job builder: one job per declared `safe-outputs.*` type,
//! plus pass-through for user-defined custom jobs under `safe-outputs.jobs`.
//!
//! Every generated job follows the same eleven-step shape regardless of
//! output kind: fetch the agent's output file, select lines of this job's
//! `type` and cap at `max`, validate the selected fields, sanitize free text,
//! branch into a staged preview when `staged: true`, otherwise execute the
//! GitHub side effect, resolve the target repo, apply a fallback when the
//! primary action fails (currently only `create-pull-request`), run the
//! patch-validation hook for `push-to-pull-request-branch`, export job
//! outputs, and append a step-summary line.

use crate::lock::{Job, Step};
use crate::permissions::safe_output_write_scopes;
use crate::templates::{PR_METADATA_VALIDATION_SCRIPT, SAFE_OUTPUT_FETCH_SCRIPT, STAGED_PREVIEW_SCRIPT};
use gh_aw_schema::{SafeOutputJobConfig, SafeOutputType, SafeOutputsSpec};
use std::collections::BTreeMap;

/// `head -n` has no portable "unlimited" spelling, so an unlimited cap is
/// rendered as a count no real agent run will reach instead.
const UNLIMITED_MAX: u32 = u32::MAX;

fn resolved_max(kind: SafeOutputType, config: &SafeOutputJobConfig) -> u32 {
    config.max.or(kind.default_max()).unwrap_or(UNLIMITED_MAX)
}

/// Strip a `${{ ... }}` wrapper so fragments can be joined with `||` inside
/// a single outer expression.
fn strip_expression_wrapper(raw: &str) -> String {
    let trimmed = raw.trim();
    trimmed
        .strip_prefix("${{")
        .and_then(|s| s.strip_suffix("}}"))
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| trimmed.to_string())
}

/// Token precedence: per-output `github-token` → global
/// `safe-outputs.github-token` → workflow-level `github-token` →
/// `secrets.GH_AW_GITHUB_TOKEN` → `secrets.GITHUB_TOKEN`. `create-agent-task`
/// hands off to Copilot, which has its own chain ending at
/// `secrets.COPILOT_GITHUB_TOKEN` instead of `secrets.GITHUB_TOKEN`.
fn github_token_expression(kind: SafeOutputType, per_output: Option<&str>, global: Option<&str>, workflow: Option<&str>) -> String {
    let mut layers: Vec<String> = [per_output, global, workflow]
        .into_iter()
        .flatten()
        .map(strip_expression_wrapper)
        .collect();
    layers.push("secrets.GH_AW_GITHUB_TOKEN".to_string());
    layers.push(if kind == SafeOutputType::CreateAgentTask {
        "secrets.COPILOT_GITHUB_TOKEN".to_string()
    } else {
        "secrets.GITHUB_TOKEN".to_string()
    });
    format!("${{{{ {} }}}}", layers.join(" || "))
}

fn render(template: &crate::templates::Template, params: &[(&str, String)]) -> String {
    let mut map = BTreeMap::new();
    for (key, value) in params {
        map.insert(*key, value.clone());
    }
    template.render(&map)
}

fn execute_script(kind: SafeOutputType) -> String {
    match kind {
        SafeOutputType::CreateIssue => {
            "gh issue create --title \"$(jq -r .title item.json)\" --body \"$(jq -r .body item.json)\" --label \"${LABELS:-}\"".to_string()
        }
        SafeOutputType::AddComment => "gh issue comment \"$ISSUE_NUMBER\" --body \"$(jq -r .body item.json)\"".to_string(),
        SafeOutputType::CreatePullRequest => {
            "git checkout -b \"$BRANCH_NAME\" && git apply patch.diff && git push origin \"$BRANCH_NAME\" && gh pr create --title \"$(jq -r .title item.json)\" --body \"$(jq -r .body item.json)\"".to_string()
        }
        SafeOutputType::PushToPullRequestBranch => "git apply patch.diff && git push origin \"$PR_BRANCH\"".to_string(),
        SafeOutputType::CreatePullRequestReviewComment => {
            "gh api repos/${GITHUB_REPOSITORY}/pulls/${PR_NUMBER}/comments -f body=\"$(jq -r .body item.json)\" -F line=\"$(jq -r .line item.json)\"".to_string()
        }
        SafeOutputType::CreateDiscussion => "gh api graphql -f query=@create_discussion.graphql".to_string(),
        SafeOutputType::CreateAgentTask => "gh api graphql -f query=@create_agent_task.graphql".to_string(),
        SafeOutputType::AddLabels => "gh issue edit \"$ISSUE_NUMBER\" --add-label \"$(jq -r '.labels | join(\",\")' item.json)\"".to_string(),
        SafeOutputType::UpdateIssue => "gh issue edit \"$ISSUE_NUMBER\" --body \"$(jq -r .body item.json)\"".to_string(),
        SafeOutputType::UpdateRelease => "gh release edit \"$(jq -r .tag item.json)\" --notes \"$(jq -r .body item.json)\"".to_string(),
        SafeOutputType::CreateCodeScanningAlert => "gh api repos/${GITHUB_REPOSITORY}/code-scanning/sarifs -f sarif=@alert.sarif".to_string(),
        SafeOutputType::MissingTool => "echo \"::notice::missing tool reported: $(jq -r .tool item.json)\"".to_string(),
        SafeOutputType::PublishAsset => "cp \"$(jq -r .path item.json)\" \"$GITHUB_WORKSPACE/assets/\"".to_string(),
        SafeOutputType::Noop => "echo \"::notice::noop: $(jq -r .message item.json)\"".to_string(),
    }
}

/// Build the job for one declared output type. `allowed_domains` scopes the
/// sanitizer's URL redaction pass beyond the built-in GitHub hosts;
/// `global_github_token`/`workflow_github_token` are the outer two links of
/// the token-precedence chain, below this type's own `config.github_token`.
pub fn build_job(
    kind: SafeOutputType,
    config: &SafeOutputJobConfig,
    staged: bool,
    allowed_domains: &[String],
    global_github_token: Option<&str>,
    workflow_github_token: Option<&str>,
) -> Job {
    let max = resolved_max(kind, config);

    let mut job = Job::new("ubuntu-latest").needs("agent").permission("contents", "read");
    for (scope, level) in safe_output_write_scopes(kind) {
        job = job.permission(scope, level);
    }
    if let Some(condition) = &config.condition {
        job = job.if_condition(condition.clone());
    }
    job = job.env_entry(
        "GH_TOKEN",
        github_token_expression(kind, config.github_token.as_deref(), global_github_token, workflow_github_token),
    );

    job = job.step(Step::run(
        "Select safe output items",
        render(
            &SAFE_OUTPUT_FETCH_SCRIPT,
            &[("output_type", kind.as_str().to_string()), ("max_items", max.to_string())],
        ),
    ));

    let domain_flags = allowed_domains.iter().map(|d| format!(" --allowed-domain {d}")).collect::<String>();
    job = job.step(Step::run(
        "Sanitize item text",
        format!(
            "while IFS= read -r line; do echo \"$line\" | jq -r '.body // \"\"' | gh-aw sanitize{domain_flags} | jq -Rs '{{body: .}}' | jq -c --argjson rest \"$line\" '$rest * .' >> sanitized.jsonl; done < selected.jsonl"
        ),
    ));

    if staged {
        job = job.step(Step::run(
            "Staged preview",
            render(&STAGED_PREVIEW_SCRIPT, &[("output_type", kind.as_str().to_string())]),
        ));
    } else {
        let mut execute = Step::run("Execute safe output", execute_script(kind)).with_if("steps.select.outputs.count != '0'".to_string());
        if let Some(target_repo) = &config.target_repo {
            execute = execute.with_env("TARGET_REPO", target_repo.clone());
        }
        if !config.labels.is_empty() {
            execute = execute.with_env("LABELS", config.labels.join(","));
        }
        if let Some(prefix) = &config.title_prefix {
            execute = execute.with_env("TITLE_PREFIX", prefix.clone());
        }
        job = job.step(execute);

        if kind == SafeOutputType::CreatePullRequest {
            job = job.step(
                Step::run(
                    "Fall back to an issue comment",
                    "gh issue comment \"$ISSUE_NUMBER\" --body 'Automated pull request could not be created; see run log.'",
                )
                .with_if("failure()".to_string()),
            );
        }
        if kind == SafeOutputType::PushToPullRequestBranch {
            job = job.step(
                Step::run("Validate pushed patch", "git apply --check patch.diff")
                    .with_if("steps.select.outputs.count != '0'".to_string()),
            );
            if config.title_prefix.is_some() || !config.labels.is_empty() {
                let mut validate = Step::run(
                    "Validate target PR metadata",
                    render(&PR_METADATA_VALIDATION_SCRIPT, &[]),
                )
                .with_if("steps.select.outputs.count != '0'".to_string());
                if let Some(prefix) = &config.title_prefix {
                    validate = validate.with_env("TITLE_PREFIX", prefix.clone());
                }
                if !config.labels.is_empty() {
                    validate = validate.with_env("LABELS", config.labels.join(","));
                }
                job = job.step(validate);
            }
        }
    }

    job.step(Step::run(
        "Append summary",
        format!("echo \"### {}: processed $(cat selected.jsonl | wc -l) item(s)\" >> \"$GITHUB_STEP_SUMMARY\"", kind.as_str()),
    ))
    .output("processed-count", "${{ steps.select.outputs.count }}")
}

/// Build every job named by `spec`: one per declared output type, one per
/// custom job under `jobs`, keyed by job id. `workflow_github_token` is the
/// workflow-level `github-token`, the third link in the precedence chain
/// below `spec.github_token` and each type's own `config.github_token`.
pub fn build_jobs(spec: &SafeOutputsSpec, all_kinds: &[SafeOutputType], workflow_github_token: Option<&str>) -> Vec<(String, Job)> {
    let mut jobs = Vec::new();
    for kind in all_kinds {
        if *kind == SafeOutputType::Noop {
            if spec.noop_enabled() {
                let config = spec.noop_config();
                jobs.push((
                    "safe_output_noop".to_string(),
                    build_job(
                        SafeOutputType::Noop,
                        &config,
                        spec.staged,
                        &spec.allowed_domains,
                        spec.github_token.as_deref(),
                        workflow_github_token,
                    ),
                ));
            }
            continue;
        }
        if let Some(config) = spec.declared_types.get(kind.as_str()) {
            jobs.push((
                format!("safe_output_{}", kind.as_str().replace('-', "_")),
                build_job(
                    *kind,
                    config,
                    spec.staged,
                    &spec.allowed_domains,
                    spec.github_token.as_deref(),
                    workflow_github_token,
                ),
            ));
        }
    }
    jobs
}

pub const ALL_SAFE_OUTPUT_TYPES: [SafeOutputType; 14] = [
    SafeOutputType::CreateIssue,
    SafeOutputType::AddComment,
    SafeOutputType::CreatePullRequest,
    SafeOutputType::PushToPullRequestBranch,
    SafeOutputType::CreatePullRequestReviewComment,
    SafeOutputType::CreateDiscussion,
    SafeOutputType::CreateAgentTask,
    SafeOutputType::AddLabels,
    SafeOutputType::UpdateIssue,
    SafeOutputType::UpdateRelease,
    SafeOutputType::CreateCodeScanningAlert,
    SafeOutputType::MissingTool,
    SafeOutputType::PublishAsset,
    SafeOutputType::Noop,
];
