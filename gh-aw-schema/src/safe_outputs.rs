//! `SafeOutputsSpec`: declared output types and shared job-level knobs.

use serde::{Deserialize, Serialize};

/// One of the recognized `safe-outputs.*` job types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SafeOutputType {
    CreateIssue,
    AddComment,
    CreatePullRequest,
    PushToPullRequestBranch,
    CreatePullRequestReviewComment,
    CreateDiscussion,
    CreateAgentTask,
    AddLabels,
    UpdateIssue,
    UpdateRelease,
    CreateCodeScanningAlert,
    MissingTool,
    PublishAsset,
    Noop,
}

impl SafeOutputType {
    pub fn as_str(self) -> &'static str {
        match self {
            SafeOutputType::CreateIssue => "create-issue",
            SafeOutputType::AddComment => "add-comment",
            SafeOutputType::CreatePullRequest => "create-pull-request",
            SafeOutputType::PushToPullRequestBranch => "push-to-pull-request-branch",
            SafeOutputType::CreatePullRequestReviewComment => "create-pull-request-review-comment",
            SafeOutputType::CreateDiscussion => "create-discussion",
            SafeOutputType::CreateAgentTask => "create-agent-task",
            SafeOutputType::AddLabels => "add-labels",
            SafeOutputType::UpdateIssue => "update-issue",
            SafeOutputType::UpdateRelease => "update-release",
            SafeOutputType::CreateCodeScanningAlert => "create-code-scanning-alert",
            SafeOutputType::MissingTool => "missing-tool",
            SafeOutputType::PublishAsset => "publish-asset",
            SafeOutputType::Noop => "noop",
        }
    }

    /// Job types that touch a pull request's branch or the repository's
    /// release objects and therefore require `contents: write` rather than
    /// the default read-only permission set.
    pub fn requires_contents_write(self) -> bool {
        matches!(
            self,
            SafeOutputType::CreatePullRequest | SafeOutputType::PushToPullRequestBranch | SafeOutputType::UpdateRelease
        )
    }

    /// The per-type default cap on how many actions a job instance performs
    /// when `max` is not configured. `None` means unlimited.
    pub fn default_max(self) -> Option<u32> {
        match self {
            SafeOutputType::AddLabels => Some(3),
            SafeOutputType::CreateCodeScanningAlert | SafeOutputType::MissingTool => None,
            _ => Some(1),
        }
    }
}

/// Per-type knobs common to most `safe-outputs.*` entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SafeOutputJobConfig {
    #[serde(default)]
    pub max: Option<u32>,
    #[serde(default, rename = "target-repo")]
    pub target_repo: Option<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default, rename = "title-prefix")]
    pub title_prefix: Option<String>,
    #[serde(rename = "if", default)]
    pub condition: Option<String>,
    /// Overrides the global `safe-outputs.github-token` (and, below that,
    /// the workflow-level `github-token`) for this output type alone.
    #[serde(default, rename = "github-token")]
    pub github_token: Option<String>,
}

/// `noop:` — either a bare enable/disable flag or a full job config, kept
/// out of `declared_types`'s flatten catch-all so it can carry its own
/// auto-enable semantics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NoopDecl {
    Enabled(bool),
    Config(SafeOutputJobConfig),
}

/// The `safe-outputs:` section: declared output types plus cross-cutting
/// options (shared `allowed-domains`, the `staged` preview flag, an
/// optional `threat-detection` engine override, and user-defined custom
/// jobs under `jobs`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SafeOutputsSpec {
    #[serde(flatten)]
    pub declared_types: std::collections::BTreeMap<String, SafeOutputJobConfig>,
    #[serde(default, rename = "allowed-domains")]
    pub allowed_domains: Vec<String>,
    #[serde(default)]
    pub staged: bool,
    #[serde(default, rename = "threat-detection")]
    pub threat_detection: Option<crate::engine::EngineSpec>,
    /// Second link in the token-precedence chain: used when a declared
    /// type has no `github-token` of its own.
    #[serde(default, rename = "github-token")]
    pub github_token: Option<String>,
    /// `noop: false` opts out of the auto-enable described by
    /// [`SafeOutputsSpec::noop_enabled`]; any other value (a config object,
    /// or `true`) enables it explicitly.
    #[serde(default)]
    pub noop: Option<NoopDecl>,
    /// Custom, user-authored safe-output jobs, keyed by job name; each
    /// must be globally unique across the main file and all its imports.
    #[serde(default)]
    pub jobs: std::collections::BTreeMap<String, serde_yaml::Value>,
}

impl SafeOutputsSpec {
    pub fn declares(&self, kind: SafeOutputType) -> bool {
        if kind == SafeOutputType::Noop {
            return self.noop_enabled();
        }
        self.declared_types.contains_key(kind.as_str())
    }

    /// `noop` auto-enables whenever any other safe-output type is declared,
    /// unless the author opts out with `noop: false`.
    pub fn noop_enabled(&self) -> bool {
        match &self.noop {
            Some(NoopDecl::Enabled(flag)) => *flag,
            Some(NoopDecl::Config(_)) => true,
            None => !self.declared_types.is_empty(),
        }
    }

    pub fn noop_config(&self) -> SafeOutputJobConfig {
        match &self.noop {
            Some(NoopDecl::Config(config)) => config.clone(),
            _ => SafeOutputJobConfig::default(),
        }
    }
}

/// One line of the newline-delimited JSON safe-output protocol emitted by
/// the engine's harness and consumed by the safe-outputs server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafeOutputLine {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declares_checks_job_presence() {
        let yaml = "create-issue:\n  max: 3\n";
        let spec: SafeOutputsSpec = serde_yaml::from_str(yaml).unwrap();
        assert!(spec.declares(SafeOutputType::CreateIssue));
        assert!(!spec.declares(SafeOutputType::AddComment));
        assert_eq!(spec.declared_types["create-issue"].max, Some(3));
    }

    #[test]
    fn allowed_domains_and_jobs_coexist_under_flatten() {
        let yaml = "add-comment: {}\nallowed-domains: [example.com]\nstaged: true\njobs:\n  deploy:\n    runs-on: ubuntu-latest\n";
        let spec: SafeOutputsSpec = serde_yaml::from_str(yaml).unwrap();
        assert!(spec.declares(SafeOutputType::AddComment));
        assert_eq!(spec.allowed_domains, vec!["example.com".to_string()]);
        assert!(spec.staged);
        assert!(spec.jobs.contains_key("deploy"));
    }

    #[test]
    fn contents_write_types_are_flagged() {
        assert!(SafeOutputType::CreatePullRequest.requires_contents_write());
        assert!(!SafeOutputType::AddComment.requires_contents_write());
    }

    #[test]
    fn default_max_matches_per_type_table() {
        assert_eq!(SafeOutputType::AddLabels.default_max(), Some(3));
        assert_eq!(SafeOutputType::CreateCodeScanningAlert.default_max(), None);
        assert_eq!(SafeOutputType::MissingTool.default_max(), None);
        assert_eq!(SafeOutputType::Noop.default_max(), Some(1));
        assert_eq!(SafeOutputType::CreateIssue.default_max(), Some(1));
    }

    #[test]
    fn noop_auto_enables_when_another_type_is_declared() {
        let spec: SafeOutputsSpec = serde_yaml::from_str("create-issue: {}\n").unwrap();
        assert!(spec.declares(SafeOutputType::Noop));
    }

    #[test]
    fn noop_disabled_with_explicit_false() {
        let spec: SafeOutputsSpec = serde_yaml::from_str("create-issue: {}\nnoop: false\n").unwrap();
        assert!(!spec.declares(SafeOutputType::Noop));
    }

    #[test]
    fn noop_stays_disabled_with_no_other_outputs() {
        let spec = SafeOutputsSpec::default();
        assert!(!spec.declares(SafeOutputType::Noop));
    }

    #[test]
    fn github_token_can_be_set_per_type_and_globally() {
        let yaml = "github-token: ${{ secrets.GLOBAL_TOKEN }}\ncreate-issue:\n  github-token: ${{ secrets.ISSUE_TOKEN }}\n";
        let spec: SafeOutputsSpec = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(spec.github_token.as_deref(), Some("${{ secrets.GLOBAL_TOKEN }}"));
        assert_eq!(spec.declared_types["create-issue"].github_token.as_deref(), Some("${{ secrets.ISSUE_TOKEN }}"));
    }
}
