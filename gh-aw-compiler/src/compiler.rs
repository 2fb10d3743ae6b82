//! Top-level orchestration: runs every compiler phase over a parsed
//! document and produces the final lock file.

use crate::engines::engine_for;
use crate::errors::{CompileError, Result};
use crate::lock::{Job, LockFile, Step};
use crate::network_proxy::{apply_proxy_to_job, plan_proxies};
use crate::permissions::agent_permissions;
use crate::safe_outputs::{build_jobs, ALL_SAFE_OUTPUT_TYPES};
use crate::secrets::apply_secret_redaction;
use crate::strict::validate_strict;
use crate::templates::LOG_PARSER_SCRIPT;
use crate::threat_detector::{build_threat_detector_job, gating_condition};
use crate::tools::{reject_network_wildcards, resolve_tools};
use crate::triggers::{build_activation_job, compile_on_block};
use gh_aw_frontmatter::ParsedWorkflow;
use gh_aw_schema::{CompilerDiagnostic, EngineSpec};
use std::collections::BTreeMap;

const AGENT_LOG_PATH: &str = "agent-output.log";

pub const COMPILER_VERSION: &str = env!("CARGO_PKG_VERSION");

pub struct CompileOutput {
    pub lock_file: LockFile,
    pub rendered: String,
    pub diagnostics: Vec<CompilerDiagnostic>,
}

/// Compile a fully resolved workflow document into a lock file, threading
/// every phase: tool/network resolution, permission computation, strict
/// validation, trigger compilation, engine emission, safe-output jobs,
/// threat detection, and secret redaction.
pub fn compile(mut workflow: ParsedWorkflow, source_path: &str) -> Result<CompileOutput> {
    workflow.frontmatter.normalize_triggers();
    let tree = &workflow.frontmatter;

    let toolset = resolve_tools(tree)?;
    reject_network_wildcards(tree, &toolset)?;

    let agent_perms = agent_permissions(tree);

    let mut diagnostics = workflow.diagnostics.clone();
    if tree.strict {
        let violations = validate_strict(tree, &toolset, &agent_perms);
        for violation in &violations {
            diagnostics.push(CompilerDiagnostic::error("StrictViolation", violation.to_string()));
        }
        if let Some(first) = violations.into_iter().next() {
            return Err(first);
        }
    }

    let on_block = compile_on_block(&tree.on);
    let activation_job = build_activation_job(&tree.on);

    let engine_spec = tree.engine.clone().unwrap_or_default();
    let engine = engine_for(engine_spec.id);

    let mut agent_job = Job::new("ubuntu-latest").needs("activation").timeout(tree.timeout_minutes.unwrap_or(30));
    for (scope, level) in &agent_perms {
        agent_job = agent_job.permission(scope.clone(), level.clone());
    }
    for (key, value) in &tree.env {
        agent_job = agent_job.env_entry(key.clone(), value.clone());
    }
    for step in engine.installation_steps(&engine_spec) {
        agent_job = agent_job.step(step);
    }
    for step in engine.execution_steps(&engine_spec, &toolset, AGENT_LOG_PATH) {
        agent_job = agent_job.step(step);
    }

    agent_job = agent_job.step(
        Step::run(
            "Parse agent log",
            LOG_PARSER_SCRIPT.render(&BTreeMap::from([("engine_id", engine.id().to_string()), ("log_path", AGENT_LOG_PATH.to_string())])),
        )
        .with_id(engine.log_parser_script_id())
        .with_if("always()".to_string()),
    );

    for plan in plan_proxies(&toolset.mcp_servers) {
        agent_job = apply_proxy_to_job(agent_job, &plan);
    }

    let safe_outputs_spec = tree.safe_outputs_or_default();
    let has_safe_outputs = !safe_outputs_spec.declared_types.is_empty() || safe_outputs_spec.noop_enabled();

    let mut lock = LockFile::new(tree.name.clone().unwrap_or_else(|| "Untitled workflow".to_string()), on_block)
        .permission("contents", "read")
        .job("activation", activation_job)
        .job("agent", agent_job);

    if has_safe_outputs {
        let threat_detector_spec: Option<EngineSpec> = safe_outputs_spec.threat_detection.clone();
        let threat_job = build_threat_detector_job(threat_detector_spec.as_ref(), &engine_spec);
        lock = lock.job("threat_detection", threat_job);

        for (id, mut job) in build_jobs(&safe_outputs_spec, &ALL_SAFE_OUTPUT_TYPES, tree.github_token.as_deref()) {
            job = job.needs("threat_detection");
            let condition = gating_condition("threat_detection");
            job = match job.if_condition.take() {
                Some(existing) => job.if_condition(format!("({existing}) && {condition}")),
                None => job.if_condition(condition),
            };
            lock = lock.job(id, job);
        }
    }

    let lock = apply_secret_redaction(lock)?;
    let rendered = lock.render(source_path, &workflow.body, COMPILER_VERSION)?;

    Ok(CompileOutput { lock_file: lock, rendered, diagnostics })
}

#[cfg(test)]
mod tests {
    use super::*;
    use gh_aw_frontmatter::NoRemoteFetcher;
    use std::fs;

    #[test]
    fn compiles_minimal_workflow_into_lock_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("root.md"),
            "---\nname: Triage\non:\n  issues:\n    types: [opened]\ntimeout-minutes: 5\nnetwork:\n  deny-all: true\n---\nTriage the issue.\n",
        )
        .unwrap();
        let fetcher = NoRemoteFetcher;
        let parsed = gh_aw_frontmatter::parse_workflow(dir.path(), "root.md", &fetcher).unwrap();
        let output = compile(parsed, "root.md").unwrap();
        assert!(output.rendered.contains("Triage"));
        assert!(output.lock_file.jobs.iter().any(|(id, _)| id == "agent"));
    }

    #[test]
    fn safe_outputs_add_threat_detection_gate() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("root.md"),
            "---\nname: Triage\non:\n  issues:\n    types: [opened]\ntimeout-minutes: 5\nnetwork:\n  deny-all: true\nsafe-outputs:\n  create-issue:\n    max: 1\n---\nTriage the issue.\n",
        )
        .unwrap();
        let fetcher = NoRemoteFetcher;
        let parsed = gh_aw_frontmatter::parse_workflow(dir.path(), "root.md", &fetcher).unwrap();
        let output = compile(parsed, "root.md").unwrap();
        assert!(output.lock_file.jobs.iter().any(|(id, _)| id == "threat_detection"));
        let (_, safe_job) = output
            .lock_file
            .jobs
            .iter()
            .find(|(id, _)| id == "safe_output_create_issue")
            .unwrap();
        assert!(safe_job.if_condition.as_ref().unwrap().contains("BLOCK"));
    }

    #[test]
    fn workflow_env_secret_reference_triggers_redaction_step() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("root.md"),
            "---\nname: Deploy\non:\n  push:\n    branches: [main]\ntimeout-minutes: 5\nnetwork:\n  deny-all: true\nenv:\n  API_KEY: ${{ secrets.API_KEY }}\n---\nDeploy using the API key.\n",
        )
        .unwrap();
        let fetcher = NoRemoteFetcher;
        let parsed = gh_aw_frontmatter::parse_workflow(dir.path(), "root.md", &fetcher).unwrap();
        let output = compile(parsed, "root.md").unwrap();
        let (_, agent_job) = output.lock_file.jobs.iter().find(|(id, _)| id == "agent").unwrap();
        assert!(agent_job.env.iter().any(|(k, v)| k == "SECRET_API_KEY" && v.contains("secrets.API_KEY")));
        assert!(agent_job
            .steps
            .iter()
            .any(|s| s.name.as_deref() == Some("Redact secrets from logs") && s.if_condition.as_deref() == Some("always()")));
    }

    #[test]
    fn strict_mode_rejects_missing_timeout() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("root.md"), "---\nname: Triage\nstrict: true\n---\nbody\n").unwrap();
        let fetcher = NoRemoteFetcher;
        let parsed = gh_aw_frontmatter::parse_workflow(dir.path(), "root.md", &fetcher).unwrap();
        let result = compile(parsed, "root.md");
        assert!(matches!(result, Err(CompileError::StrictViolation { .. })));
    }
}
