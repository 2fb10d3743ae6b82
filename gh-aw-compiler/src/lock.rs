//! The structured lock-file tree and its single YAML emitter.
//!
//! Every phase builds or mutates a [`LockFile`]; nothing writes YAML text
//! directly. `render` is the only place indentation, quoting, and key
//! order are decided.

use serde_yaml::{Mapping, Value};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Default)]
pub struct Step {
    pub name: Option<String>,
    pub id: Option<String>,
    pub uses: Option<String>,
    pub run: Option<String>,
    pub with: Vec<(String, Value)>,
    pub env: Vec<(String, String)>,
    pub if_condition: Option<String>,
}

impl Step {
    pub fn run(name: impl Into<String>, script: impl Into<String>) -> Self {
        Step {
            name: Some(name.into()),
            run: Some(script.into()),
            ..Default::default()
        }
    }

    pub fn uses(name: impl Into<String>, action: impl Into<String>) -> Self {
        Step {
            name: Some(name.into()),
            uses: Some(action.into()),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_if(mut self, condition: impl Into<String>) -> Self {
        self.if_condition = Some(condition.into());
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with.push((key.into(), value.into()));
        self
    }

    fn to_value(&self) -> Value {
        let mut map = Mapping::new();
        if let Some(name) = &self.name {
            map.insert("name".into(), name.clone().into());
        }
        if let Some(id) = &self.id {
            map.insert("id".into(), id.clone().into());
        }
        if let Some(condition) = &self.if_condition {
            map.insert("if".into(), condition.clone().into());
        }
        if let Some(uses) = &self.uses {
            map.insert("uses".into(), uses.clone().into());
        }
        if !self.with.is_empty() {
            let mut with_map = Mapping::new();
            for (key, value) in &self.with {
                with_map.insert(key.clone().into(), value.clone());
            }
            map.insert("with".into(), Value::Mapping(with_map));
        }
        if !self.env.is_empty() {
            let mut env_map = Mapping::new();
            for (key, value) in &self.env {
                env_map.insert(key.clone().into(), value.clone().into());
            }
            map.insert("env".into(), Value::Mapping(env_map));
        }
        if let Some(run) = &self.run {
            map.insert("run".into(), run.clone().into());
        }
        Value::Mapping(map)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Job {
    pub name: Option<String>,
    pub runs_on: Value,
    pub needs: Vec<String>,
    pub if_condition: Option<String>,
    pub permissions: Vec<(String, String)>,
    pub outputs: Vec<(String, String)>,
    pub env: Vec<(String, String)>,
    pub timeout_minutes: Option<u32>,
    pub container: Option<Value>,
    pub services: Vec<(String, Value)>,
    pub steps: Vec<Step>,
}

impl Job {
    pub fn new(runs_on: impl Into<Value>) -> Self {
        Job {
            runs_on: runs_on.into(),
            ..Default::default()
        }
    }

    pub fn needs(mut self, job_id: impl Into<String>) -> Self {
        self.needs.push(job_id.into());
        self
    }

    pub fn permission(mut self, scope: impl Into<String>, level: impl Into<String>) -> Self {
        self.permissions.push((scope.into(), level.into()));
        self
    }

    pub fn output(mut self, name: impl Into<String>, expression: impl Into<String>) -> Self {
        self.outputs.push((name.into(), expression.into()));
        self
    }

    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn if_condition(mut self, condition: impl Into<String>) -> Self {
        self.if_condition = Some(condition.into());
        self
    }

    pub fn timeout(mut self, minutes: u32) -> Self {
        self.timeout_minutes = Some(minutes);
        self
    }

    pub fn env_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    fn to_value(&self) -> Value {
        let mut map = Mapping::new();
        if let Some(name) = &self.name {
            map.insert("name".into(), name.clone().into());
        }
        if !self.needs.is_empty() {
            map.insert(
                "needs".into(),
                Value::Sequence(self.needs.iter().map(|n| n.clone().into()).collect()),
            );
        }
        if let Some(condition) = &self.if_condition {
            map.insert("if".into(), condition.clone().into());
        }
        map.insert("runs-on".into(), self.runs_on.clone());
        if let Some(timeout) = self.timeout_minutes {
            map.insert("timeout-minutes".into(), timeout.into());
        }
        let mut perm_map = Mapping::new();
        for (scope, level) in &self.permissions {
            perm_map.insert(scope.clone().into(), level.clone().into());
        }
        map.insert("permissions".into(), Value::Mapping(perm_map));
        if !self.env.is_empty() {
            let mut env_map = Mapping::new();
            for (key, value) in &self.env {
                env_map.insert(key.clone().into(), value.clone().into());
            }
            map.insert("env".into(), Value::Mapping(env_map));
        }
        if let Some(container) = &self.container {
            map.insert("container".into(), container.clone());
        }
        if !self.services.is_empty() {
            let mut services_map = Mapping::new();
            for (name, value) in &self.services {
                services_map.insert(name.clone().into(), value.clone());
            }
            map.insert("services".into(), Value::Mapping(services_map));
        }
        if !self.outputs.is_empty() {
            let mut out_map = Mapping::new();
            for (name, expr) in &self.outputs {
                out_map.insert(name.clone().into(), expr.clone().into());
            }
            map.insert("outputs".into(), Value::Mapping(out_map));
        }
        map.insert(
            "steps".into(),
            Value::Sequence(self.steps.iter().map(Step::to_value).collect()),
        );
        Value::Mapping(map)
    }
}

#[derive(Debug, Clone, Default)]
pub struct LockFile {
    pub name: String,
    pub on: Value,
    pub permissions: Vec<(String, String)>,
    pub concurrency: Option<Value>,
    pub env: Vec<(String, String)>,
    pub jobs: Vec<(String, Job)>,
}

impl LockFile {
    pub fn new(name: impl Into<String>, on: Value) -> Self {
        LockFile {
            name: name.into(),
            on,
            ..Default::default()
        }
    }

    pub fn job(mut self, id: impl Into<String>, job: Job) -> Self {
        self.jobs.push((id.into(), job));
        self
    }

    pub fn permission(mut self, scope: impl Into<String>, level: impl Into<String>) -> Self {
        self.permissions.push((scope.into(), level.into()));
        self
    }

    /// Render the canonical header comment: source pointer, compiler
    /// version, and a content hash of the source Markdown for drift
    /// detection (spec.md §6).
    pub fn header(source_path: &str, source_markdown: &str, compiler_version: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(source_markdown.as_bytes());
        let digest = hasher.finalize();
        let hash_hex = digest.iter().map(|b| format!("{b:02x}")).collect::<String>();
        format!(
            "# This file was generated from {source_path}. Do not edit by hand.\n# gh-aw compiler version: {compiler_version}\n# source hash: sha256:{hash_hex}\n\n"
        )
    }

    fn body_value(&self) -> Value {
        let mut map = Mapping::new();
        map.insert("name".into(), self.name.clone().into());
        map.insert("on".into(), self.on.clone());
        let mut perm_map = Mapping::new();
        for (scope, level) in &self.permissions {
            perm_map.insert(scope.clone().into(), level.clone().into());
        }
        map.insert("permissions".into(), Value::Mapping(perm_map));
        if let Some(concurrency) = &self.concurrency {
            map.insert("concurrency".into(), concurrency.clone());
        }
        if !self.env.is_empty() {
            let mut env_map = Mapping::new();
            for (key, value) in &self.env {
                env_map.insert(key.clone().into(), value.clone().into());
            }
            map.insert("env".into(), Value::Mapping(env_map));
        }
        let mut jobs_map = Mapping::new();
        for (id, job) in &self.jobs {
            jobs_map.insert(id.clone().into(), job.to_value());
        }
        map.insert("jobs".into(), Value::Mapping(jobs_map));
        Value::Mapping(map)
    }

    /// Render the full lock file text: header comment + YAML body.
    pub fn render(&self, source_path: &str, source_markdown: &str, compiler_version: &str) -> anyhow::Result<String> {
        let header = Self::header(source_path, source_markdown, compiler_version);
        let body = serde_yaml::to_string(&self.body_value())?;
        Ok(format!("{header}{body}"))
    }
}
