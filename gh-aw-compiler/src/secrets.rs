//! Secret collector & redactor: scans the fully rendered lock file for
//! `secrets.NAME` references, wires the complete set into every job that
//! uses one as a `SECRET_NAME` env var plus a shared `GITHUB_AW_SECRET_NAMES`
//! list, and appends an `if: always()` redaction step to every job that
//! writes its own engine log, so a leaked value never reaches a log or PR
//! body no matter which job's step actually used it.

use crate::lock::{Job, LockFile, Step};
use crate::templates::REDACTION_SCRIPT;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

static SECRET_REFERENCE_REGEX: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"secrets\.([A-Z][A-Z0-9_]*)").unwrap());

/// Every `secrets.NAME` reference found in `text`, deduplicated and sorted.
pub fn collect_secret_names(text: &str) -> BTreeSet<String> {
    SECRET_REFERENCE_REGEX
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Job ids that write their own engine log and therefore need the
/// redaction step, keyed to the log file each one produces.
const ENGINE_LOG_JOBS: &[(&str, &str)] = &[("agent", "agent-output.log"), ("threat_detection", "threat-detector.log")];

fn redaction_step(target_paths: &[&str]) -> Step {
    let mut params = BTreeMap::new();
    params.insert("target_paths", target_paths.iter().map(|p| format!("\"{p}\"")).collect::<Vec<_>>().join(" "));
    Step::run("Redact secrets from logs", REDACTION_SCRIPT.render(&params)).with_if("always()".to_string())
}

/// Add `SECRET_<NAME>` env wiring for every collected secret to `job`, and
/// append the redaction step when `job` writes its own log at `log_path`.
pub fn wire_secrets_into_job(mut job: Job, secret_names: &BTreeSet<String>, log_path: Option<&str>) -> Job {
    if secret_names.is_empty() {
        return job;
    }
    job.env.push(("GITHUB_AW_SECRET_NAMES".to_string(), secret_names.iter().cloned().collect::<Vec<_>>().join(",")));
    for name in secret_names {
        job.env.push((format!("SECRET_{name}"), format!("${{{{ secrets.{name} }}}}")));
    }
    if let Some(log_path) = log_path {
        job = job.step(redaction_step(&[log_path, "$GITHUB_STEP_SUMMARY"]));
    }
    job
}

/// Run secret collection + wiring across the whole lock file: the secret
/// set is gathered once from the complete rendered tree (workflow-level env
/// included), not just the job being wired, so a secret referenced only in
/// one job still gets scrubbed from every engine log that could echo it.
pub fn apply_secret_redaction(lock: LockFile) -> anyhow::Result<LockFile> {
    let full_text = lock_fragment(&lock)?;
    let names = collect_secret_names(&full_text);

    let mut updated = LockFile {
        name: lock.name,
        on: lock.on,
        permissions: lock.permissions,
        concurrency: lock.concurrency,
        env: lock.env,
        jobs: Vec::new(),
    };
    for (id, job) in lock.jobs {
        let log_path = ENGINE_LOG_JOBS.iter().find(|(job_id, _)| *job_id == id).map(|(_, path)| *path);
        updated.jobs.push((id, wire_secrets_into_job(job, &names, log_path)));
    }
    Ok(updated)
}

/// Flatten every env value and step body across the whole lock file into one
/// string so the secret scan sees references regardless of which job or
/// workflow-level block they live in.
fn lock_fragment(lock: &LockFile) -> anyhow::Result<String> {
    let mut out = String::new();
    for (_, value) in &lock.env {
        out.push_str(value);
        out.push('\n');
    }
    for (_, job) in &lock.jobs {
        out.push_str(&job_fragment(job));
    }
    Ok(out)
}

fn job_fragment(job: &Job) -> String {
    let mut out = String::new();
    for (_, value) in &job.env {
        out.push_str(value);
        out.push('\n');
    }
    for step in &job.steps {
        if let Some(run) = &step.run {
            out.push_str(run);
            out.push('\n');
        }
        for (_, value) in &step.env {
            out.push_str(value);
            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_distinct_secret_names() {
        let names = collect_secret_names("token: ${{ secrets.OPENAI_API_KEY }} and ${{ secrets.OPENAI_API_KEY }} again, ${{ secrets.GH_PAT }}");
        assert_eq!(names, BTreeSet::from(["OPENAI_API_KEY".to_string(), "GH_PAT".to_string()]));
    }

    #[test]
    fn wiring_adds_env_and_redaction_step() {
        let job = Job::new("ubuntu-latest");
        let names = BTreeSet::from(["OPENAI_API_KEY".to_string()]);
        let wired = wire_secrets_into_job(job, &names, Some("agent-output.log"));
        assert!(wired.env.iter().any(|(k, _)| k == "SECRET_OPENAI_API_KEY"));
        assert!(wired.steps.iter().any(|s| s.if_condition.as_deref() == Some("always()")));
    }

    #[test]
    fn empty_secret_set_leaves_job_untouched() {
        let job = Job::new("ubuntu-latest");
        let wired = wire_secrets_into_job(job, &BTreeSet::new(), Some("agent-output.log"));
        assert!(wired.env.is_empty());
        assert!(wired.steps.is_empty());
    }

    #[test]
    fn a_secret_used_in_one_job_is_scrubbed_from_every_engine_log() {
        let agent = Job::new("ubuntu-latest").step(Step::run("run agent", "echo hi"));
        let safe_output = Job::new("ubuntu-latest").step(Step::run("post comment", "gh issue comment \"$N\" --body \"${{ secrets.GH_PAT }}\""));
        let mut lock = LockFile::new("wf", serde_yaml::Value::Null);
        lock = lock.job("agent", agent).job("safe_output_add_comment", safe_output);

        let updated = apply_secret_redaction(lock).unwrap();
        let agent_job = updated.jobs.iter().find(|(id, _)| id == "agent").map(|(_, j)| j).unwrap();
        assert!(agent_job.env.iter().any(|(k, v)| k == "SECRET_GH_PAT" && v.contains("secrets.GH_PAT")));
        assert!(agent_job.steps.iter().any(|s| s.if_condition.as_deref() == Some("always()")));
    }

    #[test]
    fn threat_detection_job_also_gets_the_redaction_step() {
        let threat_detection = Job::new("ubuntu-latest").step(Step::run("review", "echo \"${{ secrets.GH_PAT }}\""));
        let mut lock = LockFile::new("wf", serde_yaml::Value::Null);
        lock = lock.job("threat_detection", threat_detection);

        let updated = apply_secret_redaction(lock).unwrap();
        let job = updated.jobs.iter().find(|(id, _)| id == "threat_detection").map(|(_, j)| j).unwrap();
        let step = job.steps.iter().find(|s| s.if_condition.as_deref() == Some("always()")).unwrap();
        assert!(step.run.as_deref().unwrap().contains("threat-detector.log"));
    }
}
